//! Filter-expression language: lexer, parser, AST and stream evaluator.
//!
//! # Supported Syntax
//!
//! | Expression | Meaning |
//! |------------|---------|
//! | `.` | Identity |
//! | `.foo`, `."my key"` | Field of an object (`null` when missing) |
//! | `.[0]`, `.[-1]` | Array element, negatives count from the end |
//! | `.[]` | Every element of an array or value of an object |
//! | `a \| b` | Run `b` on every output of `a` |
//! | `a // b` | First alternative with a truthy output |
//! | `select(cond)` | Keep the input when `cond` is truthy |
//! | `.age > 30` | Comparison against a literal |
//! | `[.items[] \| .id]`, `[1, 2]` | Collect outputs into an array |
//! | `{id, name: .user.name}` | Object construction |
//! | `if c then a elif d then b else e end` | Conditional |
//! | `length`, `map(.x)`, `range(0; 10; 2)` | Built-in functions |

mod ast;
mod builtins;
mod eval;
mod lexer;
mod parser;

pub use ast::{CmpOp, Expr, ObjectEntry};
pub use builtins::builtin_names;
pub use eval::evaluate;
pub use parser::parse;

use crate::error::QueryResult;
use crate::value::Value;

/// Parse `query` and evaluate it against `input`.
///
/// # Example
/// ```
/// use tq_core::{execute, Value};
/// let input: Value = serde_json::from_str(r#"{"users":[{"name":"Alice"},{"name":"Bob"}]}"#).unwrap();
/// let names = execute("[.users[].name] | join(\", \")", &input).unwrap();
/// assert_eq!(names, vec![Value::from("Alice, Bob")]);
/// ```
pub fn execute(query: &str, input: &Value) -> QueryResult<Vec<Value>> {
    let expr = parse(query)?;
    evaluate(&expr, input)
}
