//! TOON decoder: converts TOON text back into a [`Value`].
//!
//! The decoder is column based: every non-blank line is measured once
//! (spaces count 1, tabs count 2) and a nested region is the run of lines
//! indented deeper than the line that opened it. It handles:
//!
//! - Flat and nested objects (`key: value`, `key:` + deeper block)
//! - Inline primitive arrays (`key[N]: v1,v2`)
//! - Tabular arrays (`key[N]{f1,f2}:` + one row per element)
//! - Expanded lists (`key[N]:` + `- item` lines)
//! - The same array forms at the document root (`[N]: ...`)
//! - Quoted keys and values with escape sequences
//!
//! # Key design decisions
//!
//! - **Shared typing rule**: an unquoted token is a number exactly when
//!   [`is_numeric_literal`](crate::value::is_numeric_literal) says so, the
//!   same predicate the encoder uses to decide quoting.
//! - **Declared lengths are checked**: `[N]` must match the number of values,
//!   rows or items actually present.
//! - **List item objects**: the first field sits on the `- ` line; its
//!   siblings sit at the column right after `- `.

use crate::error::{Result, ToonError};
use crate::options::{ToonOptions, SUPPORTED_DELIMITERS};
use crate::value::{parse_number, Map, Value};

/// Decode TOON text into a value.
///
/// Empty input decodes to an empty object. Errors carry the 1-based line
/// number where decoding stopped.
pub fn decode(text: &str, options: &ToonOptions) -> Result<Value> {
    if !SUPPORTED_DELIMITERS.contains(&options.delimiter) {
        return Err(ToonError::decode(
            0,
            format!("unsupported delimiter {:?}", options.delimiter),
        ));
    }
    let lines = text
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let content = raw.trim();
            (!content.is_empty()).then(|| Line {
                number: i + 1,
                indent: measure_indent(raw),
                content,
            })
        })
        .collect();
    let mut decoder = Decoder {
        lines,
        pos: 0,
        delimiter: options.delimiter,
    };
    decoder.parse_document()
}

/// Decode TOON into a compact JSON string (string-in, string-out convenience).
pub fn toon_to_json(text: &str, options: &ToonOptions) -> Result<String> {
    let value = decode(text, options)?;
    Ok(serde_json::to_string(&value)?)
}

/// One non-blank source line.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    indent: usize,
    content: &'a str,
}

/// Parsed metadata from an array header like `[3]{a,b}:` or `[2]: v1,v2`.
struct ArrayHeader<'a> {
    len: usize,
    /// Tabular column names (`{f1,f2}` syntax).
    fields: Option<Vec<String>>,
    /// Raw value text after `: ` for inline arrays.
    inline: Option<&'a str>,
}

struct Decoder<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    delimiter: char,
}

impl<'a> Decoder<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    /// Classify the document as root array, root scalar or object.
    fn parse_document(&mut self) -> Result<Value> {
        let Some(first) = self.peek() else {
            return Ok(Value::Object(Map::new()));
        };

        if first.content.starts_with('[') {
            if let Some(header) = parse_header(first.content, self.delimiter, first.number)? {
                self.pos += 1;
                let value = self.parse_array_body(&header, first.indent, first.number)?;
                self.expect_end()?;
                return Ok(value);
            }
        }

        if self.lines.len() == 1 && !is_key_line(first.content, self.delimiter) {
            self.pos += 1;
            return parse_scalar(first.content, first.number);
        }

        let value = self.parse_object(first.indent)?;
        self.expect_end()?;
        Ok(value)
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            Some(line) => Err(ToonError::decode(
                line.number,
                "unexpected content after the document root",
            )),
            None => Ok(()),
        }
    }

    /// Parse the object whose fields sit exactly at column `col`.
    fn parse_object(&mut self, col: usize) -> Result<Value> {
        let mut map = Map::new();
        self.parse_fields_into(&mut map, col)?;
        Ok(Value::Object(map))
    }

    /// Parse `key...` lines at column `col` until a shallower line appears.
    fn parse_fields_into(&mut self, map: &mut Map, col: usize) -> Result<()> {
        while let Some(line) = self.peek() {
            if line.indent < col {
                break;
            }
            if line.indent > col {
                return Err(ToonError::decode(line.number, "unexpected indentation"));
            }
            let Some((key, rest)) = split_key(line.content, line.number)? else {
                return Err(ToonError::decode(
                    line.number,
                    format!("expected 'key: value', found '{}'", line.content),
                ));
            };
            self.pos += 1;
            let value = self.parse_field_value(rest, col, line.number)?;
            insert_unique(map, key, value, line.number)?;
        }
        Ok(())
    }

    /// Parse what follows a key: an array header, `:` (nested or empty
    /// object) or `: value`. `col` is the column of the key itself.
    fn parse_field_value(&mut self, rest: &'a str, col: usize, number: usize) -> Result<Value> {
        if rest.starts_with('[') {
            return match parse_header(rest, self.delimiter, number)? {
                Some(header) => self.parse_array_body(&header, col, number),
                None => Err(ToonError::decode(
                    number,
                    format!("malformed array header '{rest}'"),
                )),
            };
        }
        match rest.strip_prefix(':') {
            Some(value) if value.trim().is_empty() => self.parse_nested_object(col),
            Some(value) => parse_scalar(value, number),
            None => Err(ToonError::decode(number, "expected ':' after key")),
        }
    }

    /// A `key:` line owns every following line indented deeper than `col`.
    /// No such lines means an empty object.
    fn parse_nested_object(&mut self, col: usize) -> Result<Value> {
        match self.peek() {
            Some(next) if next.indent > col => self.parse_object(next.indent),
            _ => Ok(Value::Object(Map::new())),
        }
    }

    /// Parse the body of an array given its header. `col` is the column of
    /// the line that carried the header; body lines must be deeper.
    fn parse_array_body(&mut self, header: &ArrayHeader<'_>, col: usize, number: usize) -> Result<Value> {
        if let Some(inline) = header.inline {
            let values = split_delimited(inline, self.delimiter, number)?
                .into_iter()
                .map(|cell| parse_scalar(cell, number))
                .collect::<Result<Vec<_>>>()?;
            check_len(header.len, values.len(), number, "values")?;
            return Ok(Value::Array(values));
        }
        if let Some(fields) = &header.fields {
            return self.parse_tabular_rows(fields, header.len, col, number);
        }
        self.parse_list_items(header.len, col, number)
    }

    /// Parse tabular rows: delimiter-separated cells zipped with the header fields.
    fn parse_tabular_rows(&mut self, fields: &[String], len: usize, col: usize, number: usize) -> Result<Value> {
        let mut rows = Vec::with_capacity(len);
        while let Some(line) = self.peek() {
            if line.indent <= col {
                break;
            }
            self.pos += 1;
            let cells = split_delimited(line.content, self.delimiter, line.number)?;
            if cells.len() != fields.len() {
                return Err(ToonError::FieldCountMismatch {
                    line: line.number,
                    expected: fields.len(),
                    actual: cells.len(),
                });
            }
            let mut row = Map::new();
            for (field, cell) in fields.iter().zip(cells) {
                row.insert(field.clone(), parse_scalar(cell, line.number)?);
            }
            rows.push(Value::Object(row));
        }
        check_len(len, rows.len(), number, "rows")?;
        Ok(Value::Array(rows))
    }

    /// Parse expanded list items. Every item line must start with `-` and
    /// sit at the column of the first item; deeper lines belong to the item
    /// above them.
    fn parse_list_items(&mut self, len: usize, col: usize, number: usize) -> Result<Value> {
        let mut items = Vec::with_capacity(len);
        let item_col = match self.peek() {
            Some(first) if first.indent > col => first.indent,
            _ => {
                check_len(len, 0, number, "items")?;
                return Ok(Value::Array(items));
            }
        };

        while let Some(line) = self.peek() {
            if line.indent <= col {
                break;
            }
            if line.indent != item_col {
                return Err(ToonError::decode(
                    line.number,
                    "list item is not aligned with the items above it",
                ));
            }
            let content = match line.content.strip_prefix('-') {
                Some("") => "",
                Some(after) if after.starts_with(' ') => after.trim_start(),
                _ => {
                    return Err(ToonError::decode(
                        line.number,
                        format!("expected '- ' list item, found '{}'", line.content),
                    ))
                }
            };
            self.pos += 1;
            items.push(self.parse_list_item(content, item_col, line.number)?);
        }

        check_len(len, items.len(), number, "items")?;
        Ok(Value::Array(items))
    }

    /// Parse the content after a `- ` marker.
    fn parse_list_item(&mut self, content: &'a str, item_col: usize, number: usize) -> Result<Value> {
        // Fields of an object item line up with the text after "- ".
        let content_col = item_col + 2;

        if content.is_empty() {
            return self.parse_nested_object(item_col);
        }

        if content.starts_with('[') {
            if let Some(header) = parse_header(content, self.delimiter, number)? {
                return self.parse_array_body(&header, content_col, number);
            }
        }

        if is_key_line(content, self.delimiter) {
            if let Some((key, rest)) = split_key(content, number)? {
                let mut map = Map::new();
                let value = self.parse_field_value(rest, content_col, number)?;
                map.insert(key, value);
                self.parse_fields_into(&mut map, content_col)?;
                return Ok(Value::Object(map));
            }
        }

        parse_scalar(content, number)
    }
}

fn insert_unique(map: &mut Map, key: String, value: Value, line: usize) -> Result<()> {
    if map.contains_key(&key) {
        return Err(ToonError::decode(line, format!("duplicate key '{key}'")));
    }
    map.insert(key, value);
    Ok(())
}

fn check_len(declared: usize, found: usize, line: usize, what: &str) -> Result<()> {
    if declared != found {
        return Err(ToonError::decode(
            line,
            format!("array declares {declared} {what} but {found} were found"),
        ));
    }
    Ok(())
}

/// Does this content start with a key followed by `:` or a valid array header?
fn is_key_line(content: &str, delimiter: char) -> bool {
    match split_key(content, 0) {
        Ok(Some((_, rest))) => {
            rest.starts_with(':') || matches!(parse_header(rest, delimiter, 0), Ok(Some(_)))
        }
        _ => false,
    }
}

/// Split `key<rest>` where `rest` starts with `:` or `[`.
///
/// Returns `Ok(None)` when the content has no key shape (a bare scalar, a
/// fully quoted string). For unquoted keys the key ends at the earliest of
/// `:` or `[`, so both `key: val` and `key[N]: ...` split correctly.
fn split_key(content: &str, line: usize) -> Result<Option<(String, &str)>> {
    if content.starts_with('"') {
        let end = find_closing_quote(content, 1)
            .ok_or_else(|| ToonError::decode(line, "unterminated quoted key"))?;
        let rest = &content[end + 1..];
        if rest.starts_with(':') || rest.starts_with('[') {
            return Ok(Some((unescape_string(&content[1..end]), rest)));
        }
        return Ok(None);
    }
    let Some(end) = content.find([':', '[']) else {
        return Ok(None);
    };
    let key = content[..end].trim_end();
    if key.is_empty() {
        return Ok(None);
    }
    Ok(Some((key.to_string(), &content[end..])))
}

/// Parse an array header: `[N]`, optional `{f1,f2}`, then `:` and optional
/// inline values. Returns `Ok(None)` when the text is not header shaped.
fn parse_header(text: &str, delimiter: char, line: usize) -> Result<Option<ArrayHeader<'_>>> {
    let Some(after_open) = text.strip_prefix('[') else {
        return Ok(None);
    };
    let Some(close) = after_open.find(']') else {
        return Ok(None);
    };
    let len_str = &after_open[..close];
    if len_str.is_empty() || !len_str.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let Ok(len) = len_str.parse::<usize>() else {
        return Ok(None);
    };

    let mut rest = &after_open[close + 1..];
    let mut fields = None;
    if rest.starts_with('{') {
        let Some(end) = find_unquoted(rest, '}') else {
            return Ok(None);
        };
        let mut names: Vec<String> = Vec::new();
        for cell in split_delimited(&rest[1..end], delimiter, line)? {
            let name = parse_field_name(cell, line)?;
            if names.contains(&name) {
                return Err(ToonError::decode(line, format!("duplicate field '{name}'")));
            }
            names.push(name);
        }
        fields = Some(names);
        rest = &rest[end + 1..];
    }

    let Some(after_colon) = rest.strip_prefix(':') else {
        return Ok(None);
    };
    let inline = after_colon.trim();
    if fields.is_some() && !inline.is_empty() {
        return Err(ToonError::decode(
            line,
            "tabular header must not carry inline values",
        ));
    }
    Ok(Some(ArrayHeader {
        len,
        fields,
        inline: (!inline.is_empty()).then_some(inline),
    }))
}

/// A tabular header field: bare or quoted key.
fn parse_field_name(cell: &str, line: usize) -> Result<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Err(ToonError::decode(line, "empty field name in tabular header"));
    }
    if cell.starts_with('"') {
        return match find_closing_quote(cell, 1) {
            Some(end) if end == cell.len() - 1 => Ok(unescape_string(&cell[1..end])),
            _ => Err(ToonError::decode(line, format!("malformed field name {cell}"))),
        };
    }
    Ok(cell.to_string())
}

/// Split on `delimiter`, ignoring delimiters inside double quotes.
/// Cells are returned raw (untrimmed, quotes intact).
fn split_delimited(s: &str, delimiter: char, line: usize) -> Result<Vec<&str>> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == delimiter {
            cells.push(&s[start..i]);
            start = i + ch.len_utf8();
        }
    }
    if in_quotes {
        return Err(ToonError::decode(line, "unterminated quoted string"));
    }
    cells.push(&s[start..]);
    Ok(cells)
}

/// Position of the first `target` outside double quotes.
fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == target {
            return Some(i);
        }
    }
    None
}

/// Parse an unquoted or quoted token into a value.
///
/// Type inference order: quoted string → null → bool → number → bare string.
/// This mirrors the encoder's quoting rules: strings that look like numbers
/// or keywords are always quoted, so bare tokens can be typed safely.
fn parse_scalar(token: &str, line: usize) -> Result<Value> {
    let token = token.trim();

    if token.starts_with('"') {
        return match find_closing_quote(token, 1) {
            Some(end) if end == token.len() - 1 => {
                Ok(Value::String(unescape_string(&token[1..end])))
            }
            Some(_) => Err(ToonError::decode(
                line,
                format!("unexpected characters after closing quote in {token}"),
            )),
            None => Err(ToonError::decode(line, "unterminated quoted string")),
        };
    }

    Ok(match token {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match parse_number(token) {
            Some(n) => Value::Number(n),
            None => Value::String(token.to_string()),
        },
    })
}

/// Leading whitespace width: a space counts 1, a tab counts 2.
fn measure_indent(line: &str) -> usize {
    line.chars()
        .map_while(|c| match c {
            ' ' => Some(1),
            '\t' => Some(2),
            _ => None,
        })
        .sum()
}

/// Find the position of the closing quote, handling escape sequences
fn find_closing_quote(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
        } else if bytes[i] == b'"' {
            return Some(i);
        } else {
            i += 1;
        }
    }
    None
}

/// Unescape a TOON string (handle \\, \", \n, \r, \t)
fn unescape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
