//! Stream evaluator: every expression maps one input value to an ordered
//! list of zero or more outputs.

use super::ast::{CmpOp, Expr};
use super::builtins;
use crate::error::{QueryError, QueryResult};
use crate::value::{Map, Value};

/// Evaluate `expr` against `input`.
///
/// # Example
/// ```
/// use tq_core::query::{evaluate, parse};
/// use tq_core::Value;
/// let input: Value = serde_json::from_str(r#"{"items":[1,2,3]}"#).unwrap();
/// let expr = parse(".items[] | select(. >= 2)").unwrap();
/// assert_eq!(evaluate(&expr, &input).unwrap(), vec![Value::from(2.0), Value::from(3.0)]);
/// ```
pub fn evaluate(expr: &Expr, input: &Value) -> QueryResult<Vec<Value>> {
    match expr {
        Expr::Identity => Ok(vec![input.clone()]),
        Expr::Field(name) => Ok(vec![field(input, name)?]),
        Expr::Index(index) => Ok(vec![element(input, *index)?]),
        Expr::Iterate => iterate(input),
        Expr::Pipe(left, right) => {
            let mut out = Vec::new();
            for value in evaluate(left, input)? {
                out.extend(evaluate(right, &value)?);
            }
            Ok(out)
        }
        Expr::Select(cond) => {
            if condition_holds(cond, input)? {
                Ok(vec![input.clone()])
            } else {
                Ok(Vec::new())
            }
        }
        Expr::Comparison { op, left, right } => evaluate(left, input)?
            .iter()
            .map(|value| compare(*op, value, right).map(Value::Bool))
            .collect(),
        Expr::ArrayConstruct(elements) => {
            let mut items = Vec::new();
            for element in elements {
                items.extend(evaluate(element, input)?);
            }
            Ok(vec![Value::Array(items)])
        }
        Expr::ObjectConstruct(entries) => {
            let mut map = Map::new();
            for entry in entries {
                let value = match &entry.value {
                    Some(expr) => first_output(expr, input)?.unwrap_or(Value::Null),
                    None => field(input, &entry.key)?,
                };
                map.insert(entry.key.clone(), value);
            }
            Ok(vec![Value::Object(map)])
        }
        Expr::FunctionCall { name, args } => builtins::call(name, args, input),
        Expr::If {
            cond,
            then_branch,
            else_branch,
        } => {
            if condition_holds(cond, input)? {
                evaluate(then_branch, input)
            } else {
                evaluate(else_branch, input)
            }
        }
        Expr::Alternative(alternatives) => {
            let mut last = Vec::new();
            for alternative in alternatives {
                let outputs = evaluate(alternative, input)?;
                if outputs.iter().any(Value::is_truthy) {
                    return Ok(outputs.into_iter().filter(Value::is_truthy).collect());
                }
                last = outputs;
            }
            Ok(last)
        }
        Expr::Literal(value) => Ok(vec![value.clone()]),
    }
}

/// The first output of `expr`, if it produced any.
pub(crate) fn first_output(expr: &Expr, input: &Value) -> QueryResult<Option<Value>> {
    Ok(evaluate(expr, input)?.into_iter().next())
}

/// Truthiness of the first output; no output counts as false.
fn condition_holds(cond: &Expr, input: &Value) -> QueryResult<bool> {
    Ok(first_output(cond, input)?.is_some_and(|v| v.is_truthy()))
}

fn field(input: &Value, name: &str) -> QueryResult<Value> {
    match input {
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        other => Err(QueryError::type_error(
            format!("field access .{name}"),
            "object",
            other.type_name(),
        )),
    }
}

/// Index into an array; negative indices count from the end.
fn element(input: &Value, index: i64) -> QueryResult<Value> {
    let Value::Array(items) = input else {
        return Err(QueryError::type_error(
            format!("index [{index}]"),
            "array",
            input.type_name(),
        ));
    };
    let resolved = if index < 0 {
        items.len() as i64 + index
    } else {
        index
    };
    usize::try_from(resolved)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(QueryError::IndexOutOfRange {
            index,
            length: items.len(),
        })
}

fn iterate(input: &Value) -> QueryResult<Vec<Value>> {
    match input {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(map) => Ok(map.values().cloned().collect()),
        other => Err(QueryError::type_error(
            "iteration []",
            "array or object",
            other.type_name(),
        )),
    }
}

/// Two numbers compare numerically. Any other pair supports only `==` and
/// `!=`, compared by string representation.
fn compare(op: CmpOp, left: &Value, right: &Value) -> QueryResult<bool> {
    if let (Value::Number(a), Value::Number(b)) = (left, right) {
        return Ok(match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        });
    }
    match op {
        CmpOp::Eq => Ok(left.to_string() == right.to_string()),
        CmpOp::Ne => Ok(left.to_string() != right.to_string()),
        _ => Err(QueryError::type_error(
            format!("comparison {op}"),
            "two numbers",
            format!("{} and {}", left.type_name(), right.type_name()),
        )),
    }
}
