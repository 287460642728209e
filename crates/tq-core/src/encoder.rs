//! TOON encoder: converts a [`Value`] into Token-Oriented Object Notation.
//!
//! - **Key folding**: nested objects expressed via indentation, no braces
//! - **Inline arrays**: primitive arrays as `key[N]: v1,v2,v3`
//! - **Tabular arrays**: uniform object arrays as `key[N]{f1,f2}:\n  v1,v2\n  v3,v4`
//! - **Expanded lists**: everything else as `key[N]:\n  - item1\n  - item2`
//! - **Minimal quoting**: strings are quoted only when a bare token would be
//!   read back as something else
//!
//! Objects are emitted in sorted key order (the `Value` map is a `BTreeMap`),
//! so the same value always encodes to the same text.
//!
//! # Example
//! ```
//! use tq_core::{encode, ToonOptions, Value};
//! let value: Value = serde_json::from_str(r#"{"tags":["admin","ops"],"name":"Alice"}"#).unwrap();
//! let toon = encode(&value, &ToonOptions::default()).unwrap();
//! assert_eq!(toon, "name: Alice\ntags[2]: admin,ops");
//! ```

use crate::error::{Result, ToonError};
use crate::options::ToonOptions;
use crate::value::{format_number, is_numeric_literal, Map, Value};

/// Encode a value into TOON text.
///
/// The output has no trailing newline and no trailing spaces. Fails on
/// non-finite numbers and on invalid options.
pub fn encode(value: &Value, options: &ToonOptions) -> Result<String> {
    options.validate()?;
    let encoder = Encoder {
        delimiter: options.delimiter,
        unit: options.indent_unit(),
        hyphen_pad: if options.use_tab { "\t" } else { "  " },
    };
    let mut out = String::new();
    encoder.encode_root(value, &mut out)?;
    Ok(out)
}

/// Encode a JSON string into TOON (string-in, string-out convenience).
pub fn json_to_toon(json: &str, options: &ToonOptions) -> Result<String> {
    let value: Value = serde_json::from_str(json)?;
    encode(&value, options)
}

struct Encoder {
    delimiter: char,
    /// One level of indentation.
    unit: String,
    /// Padding that lines up with the content after a `- ` marker. A tab
    /// counts as two columns, the width of `- `.
    hyphen_pad: &'static str,
}

impl Encoder {
    /// Top-level dispatch: objects emit fields, arrays emit root array syntax,
    /// primitives emit a bare value.
    fn encode_root(&self, value: &Value, out: &mut String) -> Result<()> {
        match value {
            Value::Object(map) => self.encode_object_fields(map, "", "", out),
            Value::Array(arr) => self.encode_array_field("", arr, "", "", out),
            scalar => {
                self.encode_scalar(scalar, out)?;
                Ok(())
            }
        }
    }

    /// Emit all key-value pairs of an object, one per line.
    ///
    /// `lead` is written before the first field instead of `prefix`; list
    /// items use it to put the first field on the `- ` line.
    fn encode_object_fields(&self, map: &Map, lead: &str, prefix: &str, out: &mut String) -> Result<()> {
        for (i, (key, value)) in map.iter().enumerate() {
            let line_prefix = if i == 0 { lead } else { prefix };
            self.encode_field(&encode_key(key), value, line_prefix, prefix, out)?;
        }
        Ok(())
    }

    /// Dispatch a field's value to the appropriate TOON encoding:
    /// - Empty objects → `key:`
    /// - Non-empty objects → `key:\n  child_key: child_val`
    /// - Arrays → delegated to `encode_array_field` (inline/tabular/expanded)
    /// - Primitives → `key: value`
    fn encode_field(
        &self,
        key: &str,
        value: &Value,
        line_prefix: &str,
        prefix: &str,
        out: &mut String,
    ) -> Result<()> {
        match value {
            Value::Object(map) => {
                start_line(out, line_prefix);
                out.push_str(key);
                out.push(':');
                if !map.is_empty() {
                    let child = self.child_prefix(prefix);
                    self.encode_object_fields(map, &child, &child, out)?;
                }
                Ok(())
            }
            Value::Array(arr) => self.encode_array_field(key, arr, line_prefix, prefix, out),
            scalar => {
                start_line(out, line_prefix);
                out.push_str(key);
                out.push_str(": ");
                self.encode_scalar(scalar, out)
            }
        }
    }

    /// Encode an array header and body, selecting the TOON representation:
    ///
    /// 1. **Empty**: `key[0]:`
    /// 2. **Tabular**: uniform objects with scalar values →
    ///    `key[N]{f1,f2}:\n  v1,v2\n  v3,v4`
    /// 3. **Inline**: all scalars → `key[N]: v1,v2,v3`
    /// 4. **Expanded list**: anything else → `key[N]:\n  - item1\n  - item2`
    fn encode_array_field(
        &self,
        key: &str,
        arr: &[Value],
        line_prefix: &str,
        prefix: &str,
        out: &mut String,
    ) -> Result<()> {
        start_line(out, line_prefix);
        out.push_str(key);
        out.push_str(&format!("[{}]", arr.len()));

        if arr.is_empty() {
            out.push(':');
            return Ok(());
        }

        let child = self.child_prefix(prefix);

        if let Some(fields) = detect_tabular(arr) {
            let header: Vec<String> = fields.iter().map(|f| encode_key(f)).collect();
            out.push('{');
            out.push_str(&header.join(&self.delimiter.to_string()));
            out.push_str("}:");
            return self.encode_tabular_rows(arr, &fields, &child, out);
        }

        if all_primitives(arr) {
            out.push_str(": ");
            return self.encode_inline_values(arr, out);
        }

        out.push(':');
        self.encode_list_items(arr, &child, out)
    }

    /// Emit delimiter-separated scalars on the current line: `v1,v2,v3`
    fn encode_inline_values(&self, arr: &[Value], out: &mut String) -> Result<()> {
        for (i, val) in arr.iter().enumerate() {
            if i > 0 {
                out.push(self.delimiter);
            }
            self.encode_scalar(val, out)?;
        }
        Ok(())
    }

    /// Emit tabular rows: each object's values in header order, keys not repeated.
    fn encode_tabular_rows(&self, arr: &[Value], fields: &[&String], row_prefix: &str, out: &mut String) -> Result<()> {
        for item in arr {
            let Value::Object(map) = item else {
                return Err(ToonError::Encode(format!(
                    "tabular array contains a non-object element ({})",
                    item.type_name()
                )));
            };
            start_line(out, row_prefix);
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(self.delimiter);
                }
                let cell = map.get(*field).unwrap_or(&Value::Null);
                self.encode_scalar(cell, out)?;
            }
        }
        Ok(())
    }

    /// Emit expanded list items with `- ` markers. Each item can be:
    /// - A scalar: `- hello`
    /// - An object: `- key1: val1\n    key2: val2` (first field on the hyphen line)
    /// - An empty object: a bare `-`
    /// - A nested array: `- [N]: v1,v2`
    fn encode_list_items(&self, arr: &[Value], item_prefix: &str, out: &mut String) -> Result<()> {
        let lead = format!("{item_prefix}- ");
        let content_prefix = format!("{item_prefix}{}", self.hyphen_pad);
        for item in arr {
            match item {
                Value::Object(map) if map.is_empty() => {
                    start_line(out, item_prefix);
                    out.push('-');
                }
                Value::Object(map) => {
                    self.encode_object_fields(map, &lead, &content_prefix, out)?;
                }
                Value::Array(inner) => {
                    self.encode_array_field("", inner, &lead, &content_prefix, out)?;
                }
                scalar => {
                    start_line(out, &lead);
                    self.encode_scalar(scalar, out)?;
                }
            }
        }
        Ok(())
    }

    /// Emit a scalar value (null, bool, number, string).
    fn encode_scalar(&self, value: &Value, out: &mut String) -> Result<()> {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) if n.is_finite() => out.push_str(&format_number(*n)),
            Value::Number(n) => {
                return Err(ToonError::Encode(format!(
                    "cannot encode non-finite number {n}"
                )))
            }
            Value::String(s) => encode_string_value(s, self.delimiter, out),
            Value::Array(_) | Value::Object(_) => {
                return Err(ToonError::Encode(format!(
                    "{} in scalar position",
                    value.type_name()
                )))
            }
        }
        Ok(())
    }

    fn child_prefix(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.unit)
    }
}

/// Begin a new output line with `prefix`; the first line gets no newline.
fn start_line(out: &mut String, prefix: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(prefix);
}

/// Emit a string value, quoting and escaping only when necessary.
fn encode_string_value(s: &str, delimiter: char, out: &mut String) {
    if needs_quoting(s, delimiter) {
        push_quoted(s, out);
    } else {
        out.push_str(s);
    }
}

fn push_quoted(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

/// Determine if a string value must be quoted to survive a decode.
///
/// A string MUST be quoted if it:
/// - Is empty or has leading/trailing whitespace
/// - Contains the active delimiter or a colon
/// - Contains a newline, carriage return, tab, double quote or backslash
/// - Is exactly `true`, `false` or `null`
/// - Starts with `-` (list item marker)
/// - Is a numeric literal (including leading-zero forms like `05`)
pub fn needs_quoting(s: &str, delimiter: char) -> bool {
    if s.is_empty() || s != s.trim() {
        return true;
    }
    if s == "true" || s == "false" || s == "null" {
        return true;
    }
    if s.starts_with('-') || is_numeric_literal(s) {
        return true;
    }
    s.chars()
        .any(|c| c == delimiter || matches!(c, ':' | '\n' | '\r' | '\t' | '"' | '\\'))
}

/// Encode an object key. Keys matching `^[A-Za-z_][A-Za-z0-9_.]*$` are emitted
/// unquoted; all others are quoted with escape sequences.
fn encode_key(key: &str) -> String {
    if is_valid_unquoted_key(key) {
        key.to_string()
    } else {
        let mut out = String::with_capacity(key.len() + 2);
        push_quoted(key, &mut out);
        out
    }
}

fn is_valid_unquoted_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Detect if an array is tabular: a non-empty list of objects sharing one
/// non-empty key set, with only scalar values. Returns the sorted field names.
fn detect_tabular(arr: &[Value]) -> Option<Vec<&String>> {
    let first = arr.first()?.as_object()?;
    if first.is_empty() {
        return None;
    }
    for item in arr {
        let obj = item.as_object()?;
        if obj.len() != first.len() || !obj.keys().eq(first.keys()) {
            return None;
        }
        if !obj.values().all(Value::is_scalar) {
            return None;
        }
    }
    Some(first.keys().collect())
}

/// Check if all array elements are scalars (not objects or arrays).
fn all_primitives(arr: &[Value]) -> bool {
    arr.iter().all(Value::is_scalar)
}
