//! Built-in function library.
//!
//! Arguments are expressions. Most are evaluated once against the call's
//! input and their first output is used; `map`, `sort_by`, `group_by` and
//! `with_entries` instead run their argument against each element.

use super::ast::Expr;
use super::eval::{evaluate, first_output};
use crate::error::{QueryError, QueryResult};
use crate::value::{parse_number, Map, Value};

/// Every builtin with the argument counts it accepts.
const BUILTINS: &[(&str, &str)] = &[
    ("length", "0"),
    ("keys", "0"),
    ("values", "0"),
    ("type", "0"),
    ("has", "1"),
    ("in", "1"),
    ("sort", "0"),
    ("reverse", "0"),
    ("unique", "0"),
    ("flatten", "0 or 1"),
    ("map", "1"),
    ("sort_by", "1"),
    ("group_by", "1"),
    ("range", "1 to 3"),
    ("first", "0 or 1"),
    ("last", "0 or 1"),
    ("add", "0"),
    ("min", "0"),
    ("max", "0"),
    ("split", "1"),
    ("join", "1"),
    ("startswith", "1"),
    ("endswith", "1"),
    ("contains", "1"),
    ("tostring", "0"),
    ("tonumber", "0"),
    ("ltrimstr", "1"),
    ("rtrimstr", "1"),
    ("to_entries", "0"),
    ("from_entries", "0"),
    ("with_entries", "1"),
    ("floor", "0"),
    ("ceil", "0"),
    ("round", "0"),
];

/// Largest array `range` will build.
const MAX_RANGE_LEN: usize = 10_000_000;

/// Names of all builtins, in table order.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Dispatch a call. Every builtin produces exactly one output.
pub(crate) fn call(name: &str, args: &[Expr], input: &Value) -> QueryResult<Vec<Value>> {
    let value = match (name, args) {
        ("length", []) => length(input)?,
        ("keys", []) => keys(input)?,
        ("values", []) => values(input)?,
        ("type", []) => Value::from(input.type_name()),
        ("has", [key]) => has(input, &arg_value(name, key, input)?)?,
        ("in", [container]) => contained_in(input, &arg_value(name, container, input)?)?,

        ("sort", []) => {
            let mut items = array_input(name, input)?.clone();
            items.sort_by(Value::sort_cmp);
            Value::Array(items)
        }
        ("reverse", []) => {
            let mut items = array_input(name, input)?.clone();
            items.reverse();
            Value::Array(items)
        }
        ("unique", []) => unique(array_input(name, input)?),
        ("flatten", []) => Value::Array(flatten(array_input(name, input)?, 1)),
        ("flatten", [depth]) => {
            let depth = integer_arg(name, depth, input)?;
            let depth = usize::try_from(depth)
                .map_err(|_| QueryError::invalid(name, "depth must not be negative"))?;
            Value::Array(flatten(array_input(name, input)?, depth))
        }
        ("map", [f]) => {
            let mut out = Vec::new();
            for item in array_input(name, input)? {
                out.extend(evaluate(f, item)?);
            }
            Value::Array(out)
        }
        ("sort_by", [f]) => sort_by(array_input(name, input)?, f)?,
        ("group_by", [f]) => group_by(array_input(name, input)?, f)?,
        ("range", [end]) => range(0.0, number_arg(name, end, input)?, 1.0)?,
        ("range", [start, end]) => range(
            number_arg(name, start, input)?,
            number_arg(name, end, input)?,
            1.0,
        )?,
        ("range", [start, end, step]) => range(
            number_arg(name, start, input)?,
            number_arg(name, end, input)?,
            number_arg(name, step, input)?,
        )?,
        ("first", []) => array_input(name, input)?.first().cloned().unwrap_or_default(),
        ("last", []) => array_input(name, input)?.last().cloned().unwrap_or_default(),
        ("first", [n]) => {
            let items = array_input(name, input)?;
            let n = count_arg(name, n, input)?.min(items.len());
            Value::Array(items[..n].to_vec())
        }
        ("last", [n]) => {
            let items = array_input(name, input)?;
            let n = count_arg(name, n, input)?.min(items.len());
            Value::Array(items[items.len() - n..].to_vec())
        }
        ("add", []) => add(array_input(name, input)?)?,
        ("min", []) => extremum(name, array_input(name, input)?, f64::min)?,
        ("max", []) => extremum(name, array_input(name, input)?, f64::max)?,

        ("split", [sep]) => {
            let s = string_input(name, input)?;
            let sep = string_arg(name, sep, input)?;
            split(s, &sep)
        }
        ("join", [sep]) => join(array_input(name, input)?, &string_arg(name, sep, input)?)?,
        ("startswith", [prefix]) => {
            Value::Bool(string_input(name, input)?.starts_with(string_arg(name, prefix, input)?.as_str()))
        }
        ("endswith", [suffix]) => {
            Value::Bool(string_input(name, input)?.ends_with(string_arg(name, suffix, input)?.as_str()))
        }
        ("contains", [needle]) => {
            Value::Bool(string_input(name, input)?.contains(string_arg(name, needle, input)?.as_str()))
        }
        ("ltrimstr", [prefix]) => {
            let s = string_input(name, input)?;
            let prefix = string_arg(name, prefix, input)?;
            Value::from(s.strip_prefix(prefix.as_str()).unwrap_or(s))
        }
        ("rtrimstr", [suffix]) => {
            let s = string_input(name, input)?;
            let suffix = string_arg(name, suffix, input)?;
            Value::from(s.strip_suffix(suffix.as_str()).unwrap_or(s))
        }
        ("tostring", []) => match input {
            Value::String(_) => input.clone(),
            Value::Array(_) | Value::Object(_) => {
                return Err(QueryError::type_error(name, "scalar", input.type_name()))
            }
            scalar => Value::String(scalar.to_string()),
        },
        ("tonumber", []) => tonumber(input)?,

        ("to_entries", []) => Value::Array(entry_list(object_input(name, input)?)),
        ("from_entries", []) => from_entries(name, array_input(name, input)?)?,
        ("with_entries", [f]) => {
            let entries = entry_list(object_input(name, input)?);
            let mut mapped = Vec::with_capacity(entries.len());
            for entry in &entries {
                mapped.extend(evaluate(f, entry)?);
            }
            from_entries(name, &mapped)?
        }

        ("floor", []) => Value::Number(number_input(name, input)?.floor()),
        ("ceil", []) => Value::Number(number_input(name, input)?.ceil()),
        ("round", []) => Value::Number(number_input(name, input)?.round()),

        _ => return Err(unknown_or_arity(name)),
    };
    Ok(vec![value])
}

fn unknown_or_arity(name: &str) -> QueryError {
    match BUILTINS.iter().find(|(builtin, _)| *builtin == name) {
        Some((_, expected)) => QueryError::Arity {
            function: name.to_string(),
            expected: (*expected).to_string(),
        },
        None => QueryError::UnknownFunction {
            name: name.to_string(),
        },
    }
}

// ============================================================================
// Input and argument helpers
// ============================================================================

fn array_input<'v>(name: &str, input: &'v Value) -> QueryResult<&'v Vec<Value>> {
    input
        .as_array()
        .ok_or_else(|| QueryError::type_error(name, "array", input.type_name()))
}

fn object_input<'v>(name: &str, input: &'v Value) -> QueryResult<&'v Map> {
    input
        .as_object()
        .ok_or_else(|| QueryError::type_error(name, "object", input.type_name()))
}

fn string_input<'v>(name: &str, input: &'v Value) -> QueryResult<&'v str> {
    input
        .as_str()
        .ok_or_else(|| QueryError::type_error(name, "string", input.type_name()))
}

fn number_input(name: &str, input: &Value) -> QueryResult<f64> {
    input
        .as_f64()
        .ok_or_else(|| QueryError::type_error(name, "number", input.type_name()))
}

/// First output of an argument evaluated against the call's input.
fn arg_value(name: &str, arg: &Expr, input: &Value) -> QueryResult<Value> {
    first_output(arg, input)?
        .ok_or_else(|| QueryError::invalid(name, "argument produced no value"))
}

fn string_arg(name: &str, arg: &Expr, input: &Value) -> QueryResult<String> {
    match arg_value(name, arg, input)? {
        Value::String(s) => Ok(s),
        other => Err(QueryError::type_error(
            name,
            "string argument",
            other.type_name(),
        )),
    }
}

fn number_arg(name: &str, arg: &Expr, input: &Value) -> QueryResult<f64> {
    match arg_value(name, arg, input)? {
        Value::Number(n) => Ok(n),
        other => Err(QueryError::type_error(
            name,
            "number argument",
            other.type_name(),
        )),
    }
}

fn integer_arg(name: &str, arg: &Expr, input: &Value) -> QueryResult<i64> {
    let n = number_arg(name, arg, input)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(QueryError::invalid(name, format!("{n} is not an integer")));
    }
    Ok(n as i64)
}

fn count_arg(name: &str, arg: &Expr, input: &Value) -> QueryResult<usize> {
    let n = integer_arg(name, arg, input)?;
    usize::try_from(n).map_err(|_| QueryError::invalid(name, "count must not be negative"))
}

// ============================================================================
// Structural
// ============================================================================

fn length(input: &Value) -> QueryResult<Value> {
    let len = match input {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(QueryError::type_error(
                "length",
                "string, array, object or null",
                other.type_name(),
            ))
        }
    };
    Ok(Value::from(len))
}

fn keys(input: &Value) -> QueryResult<Value> {
    match input {
        Value::Object(map) => Ok(Value::Array(map.keys().map(|k| Value::from(k.as_str())).collect())),
        Value::Array(items) => Ok(Value::Array((0..items.len()).map(Value::from).collect())),
        other => Err(QueryError::type_error("keys", "object or array", other.type_name())),
    }
}

fn values(input: &Value) -> QueryResult<Value> {
    match input {
        Value::Object(map) => Ok(Value::Array(map.values().cloned().collect())),
        Value::Array(_) => Ok(input.clone()),
        other => Err(QueryError::type_error("values", "object or array", other.type_name())),
    }
}

fn has(input: &Value, key: &Value) -> QueryResult<Value> {
    match (input, key) {
        (Value::Object(map), Value::String(k)) => Ok(Value::Bool(map.contains_key(k))),
        (Value::Array(items), Value::Number(i)) => Ok(Value::Bool(
            i.fract() == 0.0 && *i >= 0.0 && (*i as usize) < items.len(),
        )),
        (Value::Object(_), other) => Err(QueryError::type_error("has", "string key", other.type_name())),
        (Value::Array(_), other) => Err(QueryError::type_error("has", "numeric index", other.type_name())),
        (other, _) => Err(QueryError::type_error("has", "object or array", other.type_name())),
    }
}

/// Deep membership of the input among a container's elements or values.
fn contained_in(input: &Value, container: &Value) -> QueryResult<Value> {
    match container {
        Value::Array(items) => Ok(Value::Bool(items.contains(input))),
        Value::Object(map) => Ok(Value::Bool(map.values().any(|v| v == input))),
        other => Err(QueryError::type_error("in", "array or object argument", other.type_name())),
    }
}

// ============================================================================
// Array
// ============================================================================

fn unique(items: &[Value]) -> Value {
    let mut seen: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    Value::Array(seen)
}

fn flatten(items: &[Value], depth: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => out.extend(flatten(inner, depth - 1)),
            other => out.push(other.clone()),
        }
    }
    out
}

/// Sort key of one element: first output of `f`, `null` if none.
fn sort_key(f: &Expr, item: &Value) -> QueryResult<Value> {
    Ok(first_output(f, item)?.unwrap_or(Value::Null))
}

fn sort_by(items: &[Value], f: &Expr) -> QueryResult<Value> {
    let mut keyed = items
        .iter()
        .map(|item| Ok((sort_key(f, item)?, item.clone())))
        .collect::<QueryResult<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| a.sort_cmp(b));
    Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
}

/// Group elements whose keys render to the same string. Groups are ordered
/// by that rendered string, so a key of `10` sorts before `9`.
fn group_by(items: &[Value], f: &Expr) -> QueryResult<Value> {
    let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
    for item in items {
        let rendered = sort_key(f, item)?.to_string();
        match groups.iter_mut().find(|(r, _)| *r == rendered) {
            Some((_, members)) => members.push(item.clone()),
            None => groups.push((rendered, vec![item.clone()])),
        }
    }
    groups.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(Value::Array(
        groups
            .into_iter()
            .map(|(_, members)| Value::Array(members))
            .collect(),
    ))
}

fn range(start: f64, end: f64, step: f64) -> QueryResult<Value> {
    if step == 0.0 || !step.is_finite() {
        return Err(QueryError::invalid("range", "step must be a non-zero finite number"));
    }
    if !start.is_finite() || !end.is_finite() {
        return Err(QueryError::invalid("range", "bounds must be finite"));
    }
    let count = ((end - start) / step).ceil();
    if count <= 0.0 {
        return Ok(Value::Array(Vec::new()));
    }
    if !count.is_finite() || count > MAX_RANGE_LEN as f64 {
        return Err(QueryError::invalid(
            "range",
            format!("more than {MAX_RANGE_LEN} elements requested"),
        ));
    }
    if start + step == start {
        return Err(QueryError::invalid(
            "range",
            format!("step {step} is too small to advance from {start}"),
        ));
    }
    Ok(Value::Array(
        (0..count as usize)
            .map(|i| Value::Number(start + i as f64 * step))
            .collect(),
    ))
}

/// `add`: nulls are skipped; the rest must be all numbers, all strings, all
/// arrays or all objects. An empty array sums to 0.
fn add(items: &[Value]) -> QueryResult<Value> {
    let mut present = items.iter().filter(|v| !matches!(v, Value::Null)).peekable();
    let Some(&first) = present.peek() else {
        return Ok(Value::Number(0.0));
    };
    let kind = first.type_name();
    let mismatch = |other: &Value| QueryError::type_error("add", format!("all {kind}s"), other.type_name());

    match first {
        Value::Number(_) => {
            let mut sum = 0.0;
            for item in present {
                sum += item.as_f64().ok_or_else(|| mismatch(item))?;
            }
            Ok(Value::Number(sum))
        }
        Value::String(_) => {
            let mut out = String::new();
            for item in present {
                out.push_str(item.as_str().ok_or_else(|| mismatch(item))?);
            }
            Ok(Value::String(out))
        }
        Value::Array(_) => {
            let mut out = Vec::new();
            for item in present {
                out.extend(item.as_array().ok_or_else(|| mismatch(item))?.iter().cloned());
            }
            Ok(Value::Array(out))
        }
        Value::Object(_) => {
            let mut out = Map::new();
            for item in present {
                let map = item.as_object().ok_or_else(|| mismatch(item))?;
                out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(Value::Object(out))
        }
        other => Err(QueryError::type_error(
            "add",
            "numbers, strings, arrays or objects",
            other.type_name(),
        )),
    }
}

fn extremum(name: &str, items: &[Value], pick: fn(f64, f64) -> f64) -> QueryResult<Value> {
    let mut numbers = items.iter().map(|item| {
        item.as_f64()
            .ok_or_else(|| QueryError::type_error(name, "array of numbers", item.type_name()))
    });
    let Some(first) = numbers.next() else {
        return Err(QueryError::invalid(name, "empty array"));
    };
    let mut best = first?;
    for n in numbers {
        best = pick(best, n?);
    }
    Ok(Value::Number(best))
}

// ============================================================================
// String
// ============================================================================

fn split(s: &str, sep: &str) -> Value {
    if sep.is_empty() {
        return Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect());
    }
    Value::Array(s.split(sep).map(Value::from).collect())
}

fn join(items: &[Value], sep: &str) -> QueryResult<Value> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Null => parts.push(String::new()),
            Value::Array(_) | Value::Object(_) => {
                return Err(QueryError::type_error("join", "array of scalars", item.type_name()))
            }
            scalar => parts.push(scalar.to_string()),
        }
    }
    Ok(Value::String(parts.join(sep)))
}

fn tonumber(input: &Value) -> QueryResult<Value> {
    match input {
        Value::Number(_) => Ok(input.clone()),
        Value::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => parse_number(s.trim())
            .map(Value::Number)
            .ok_or_else(|| QueryError::invalid("tonumber", format!("cannot parse {s:?} as a number"))),
        other => Err(QueryError::type_error(
            "tonumber",
            "number, boolean or string",
            other.type_name(),
        )),
    }
}

// ============================================================================
// Object
// ============================================================================

/// `{key, value}` objects in sorted-key order.
fn entry_list(map: &Map) -> Vec<Value> {
    map.iter()
        .map(|(k, v)| {
            let mut entry = Map::new();
            entry.insert("key".to_string(), Value::from(k.as_str()));
            entry.insert("value".to_string(), v.clone());
            Value::Object(entry)
        })
        .collect()
}

/// Rebuild an object from `{key|name, value}` entries. Later entries win.
fn from_entries(name: &str, entries: &[Value]) -> QueryResult<Value> {
    let mut out = Map::new();
    for entry in entries {
        let Value::Object(fields) = entry else {
            return Err(QueryError::type_error(name, "array of entry objects", entry.type_name()));
        };
        let key = match fields.get("key").or_else(|| fields.get("name")) {
            Some(Value::String(s)) => s.clone(),
            Some(scalar @ (Value::Number(_) | Value::Bool(_))) => scalar.to_string(),
            Some(other) => {
                return Err(QueryError::type_error(name, "string key", other.type_name()))
            }
            None => return Err(QueryError::invalid(name, "entry has no 'key' or 'name'")),
        };
        let value = fields
            .get("value")
            .cloned()
            .ok_or_else(|| QueryError::invalid(name, format!("entry '{key}' has no 'value'")))?;
        out.insert(key, value);
    }
    Ok(Value::Object(out))
}
