//! Expression AST for filter queries.

use crate::value::Value;
use std::fmt;

/// A parsed query. Built once by [`parse`](crate::query::parse) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identity: `.`
    Identity,

    /// Field access: `.foo`, `."my key"` or `.["my key"]`
    Field(String),

    /// Array index access: `.[0]` or `.[-1]`
    Index(i64),

    /// Iterate all elements: `.[]`
    Iterate,

    /// Run `right` on every output of `left`: `.a | .b`.
    /// Postfix chains such as `.a.b[0]` also build left-deep pipes.
    Pipe(Box<Expr>, Box<Expr>),

    /// `select(cond)`: pass the input through when `cond` is truthy.
    Select(Box<Expr>),

    /// `left <op> literal`
    Comparison {
        op: CmpOp,
        left: Box<Expr>,
        right: Value,
    },

    /// Array construction: `[.items[] | .id]` or `[1, .a]`.
    /// Collects the outputs of every element expression into one array.
    ArrayConstruct(Vec<Expr>),

    /// Object construction: `{id, name: .user.name}`
    ObjectConstruct(Vec<ObjectEntry>),

    /// Built-in call. `length` and `length()` both have no arguments.
    FunctionCall { name: String, args: Vec<Expr> },

    /// `if cond then a else b end`; `elif` nests another `If` in `else_branch`.
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Alternative chain: `a // b // c`
    Alternative(Vec<Expr>),

    /// `null`, `true`, `false`, numbers and strings.
    Literal(Value),
}

/// One `key: value` pair of an object construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: String,
    /// `None` for the shorthand `{key}`, which reads `.key`.
    pub value: Option<Expr>,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
