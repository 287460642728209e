//! Format conversion at the edges of a run: input text to `Value`s on the way
//! in, `Value`s to TOON, JSON or YAML text on the way out.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use tq_core::{ToonOptions, Value};

use crate::config::{Config, InputFormat, OutputFormat};

// ============================================================================
// Input
// ============================================================================

/// Every input document for this run, in order.
///
/// `--null-input` short-circuits to a single `null`; `--slurp` wraps all
/// documents from all inputs into one array.
pub fn read_inputs(config: &Config) -> Result<Vec<Value>> {
    if config.null_input {
        return Ok(vec![Value::Null]);
    }

    let mut documents = Vec::new();
    if config.files.is_empty() {
        let text = read_capped(io::stdin().lock(), config.max_input_size)
            .context("Failed to read from stdin")?;
        documents.extend(
            parse_documents(&text, config.input_format, &config.toon)
                .context("Failed to parse stdin")?,
        );
    } else {
        for path in &config.files {
            let file = File::open(path)
                .with_context(|| format!("Failed to open file: {}", path.display()))?;
            let text = read_capped(file, config.max_input_size)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            documents.extend(
                parse_documents(&text, config.input_format, &config.toon)
                    .with_context(|| format!("Failed to parse {}", path.display()))?,
            );
        }
    }

    if config.slurp {
        Ok(vec![Value::Array(documents)])
    } else {
        Ok(documents)
    }
}

/// Read at most `limit` bytes; anything larger is an error rather than a
/// silent truncation.
fn read_capped(reader: impl Read, limit: u64) -> Result<String> {
    let mut text = String::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_string(&mut text)?;
    if text.len() as u64 > limit {
        bail!("input exceeds the maximum size of {limit} bytes");
    }
    tracing::debug!(bytes = text.len(), "read input");
    Ok(text)
}

/// Parse one input's text. JSON and YAML may hold several documents; TOON
/// always holds exactly one.
pub fn parse_documents(text: &str, format: InputFormat, options: &ToonOptions) -> Result<Vec<Value>> {
    let format = match format {
        InputFormat::Auto => detect_format(text),
        explicit => explicit,
    };
    tracing::debug!(?format, "parsing input");

    match format {
        // detect_format never answers Auto
        InputFormat::Json | InputFormat::Auto => serde_json::Deserializer::from_str(text)
            .into_iter::<Value>()
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid JSON"),
        InputFormat::Yaml => serde_yaml::Deserializer::from_str(text)
            .map(Value::deserialize)
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid YAML"),
        InputFormat::Toon => Ok(vec![tq_core::decode(text, options).context("Invalid TOON")?]),
    }
}

/// Guess the input format from its content.
///
/// Text opening with `{` or `[` is JSON unless its first line is a TOON root
/// array header such as `[3]: a,b,c`. Otherwise any TOON array header line
/// (`users[2]{id,name}:`, `tags[3]: ...`) means TOON, a `:` or `---` means
/// YAML, and everything else falls back to JSON.
pub fn detect_format(text: &str) -> InputFormat {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let first_line = trimmed.lines().next().unwrap_or_default();
        return if is_bracket_header(first_line) {
            InputFormat::Toon
        } else {
            InputFormat::Json
        };
    }
    if trimmed.lines().any(is_array_header_line) {
        return InputFormat::Toon;
    }
    if trimmed.contains(':') || trimmed.contains("---") {
        return InputFormat::Yaml;
    }
    InputFormat::Json
}

fn is_array_header_line(line: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix("- ").unwrap_or(line);
    match line.find('[') {
        Some(open) => !line[..open].contains(':') && is_bracket_header(&line[open..]),
        None => false,
    }
}

/// `[N]:` or `[N]{fields}:` at the start of `s`.
fn is_bracket_header(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('[') else {
        return false;
    };
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return false;
    }
    let Some(rest) = rest[digits..].strip_prefix(']') else {
        return false;
    };
    rest.starts_with(':') || (rest.starts_with('{') && rest.contains("}:"))
}

// ============================================================================
// Output
// ============================================================================

/// Render one result value in the configured output format.
///
/// Under `--raw-output` strings are written as-is in every format.
pub fn render(value: &Value, config: &Config) -> Result<String> {
    if config.raw_output {
        if let Value::String(s) = value {
            return Ok(s.clone());
        }
    }
    match config.output_format {
        OutputFormat::Toon => tq_core::encode(value, &config.toon).context("Failed to encode TOON"),
        OutputFormat::Json => render_json(value, config),
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to encode YAML"),
    }
}

fn render_json(value: &Value, config: &Config) -> Result<String> {
    if config.compact {
        return serde_json::to_string(value).context("Failed to encode JSON");
    }
    let indent = if config.toon.use_tab {
        "\t".to_string()
    } else {
        " ".repeat(config.toon.indent)
    };
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to encode JSON")?;
    String::from_utf8(buf).context("JSON output was not UTF-8")
}

// ============================================================================
// Statistics
// ============================================================================

/// Running JSON vs TOON size totals over every output value.
#[derive(Debug, Default)]
pub struct TokenStats {
    json_bytes: usize,
    toon_bytes: usize,
}

impl TokenStats {
    pub fn record(&mut self, value: &Value, options: &ToonOptions) -> Result<()> {
        self.json_bytes += serde_json::to_string(value)?.len();
        self.toon_bytes += tq_core::encode(value, options)?.len();
        Ok(())
    }

    /// Stderr report; token counts are estimated at four bytes per token.
    pub fn report(&self) -> String {
        let json_tokens = estimate_tokens(self.json_bytes);
        let toon_tokens = estimate_tokens(self.toon_bytes);
        let mut out = format!(
            "\n--- Token Statistics ---\nJSON tokens: {json_tokens}\nTOON tokens: {toon_tokens}\n"
        );
        if json_tokens > 0 {
            let reduction =
                (json_tokens as f64 - toon_tokens as f64) / json_tokens as f64 * 100.0;
            out.push_str(&format!("Reduction: {reduction:.1}%\n"));
        }
        out
    }
}

fn estimate_tokens(bytes: usize) -> usize {
    bytes / 4
}
