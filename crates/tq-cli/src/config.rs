//! Run configuration assembled once from the command line.
//!
//! Everything downstream (reading, querying, writing) takes a `&Config`;
//! nothing mutates it after `Config::from_cli` returns.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::{Component, Path, PathBuf};
use tq_core::ToonOptions;

use crate::Cli;

/// Default cap on bytes read from any single input (100 MiB).
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Guess from the content
    Auto,
    Json,
    Yaml,
    Toon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Toon,
    Json,
    Yaml,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub query: String,
    /// Input files in order; empty means stdin.
    pub files: Vec<PathBuf>,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub raw_output: bool,
    pub compact: bool,
    pub slurp: bool,
    pub null_input: bool,
    pub exit_status: bool,
    pub stats: bool,
    pub max_input_size: u64,
    pub toon: ToonOptions,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let toon = ToonOptions {
            indent: cli.indent,
            delimiter: parse_delimiter(&cli.delimiter)?,
            use_tab: cli.tab,
        };
        toon.validate().context("Invalid TOON formatting options")?;

        let (query, files) = resolve_query(cli)?;

        Ok(Self {
            query,
            files,
            input_format: cli.input_format,
            output_format: cli.output_format,
            raw_output: cli.raw_output,
            compact: cli.compact_output,
            slurp: cli.slurp,
            null_input: cli.null_input,
            exit_status: cli.exit_status,
            stats: cli.stats,
            max_input_size: cli.max_input_size,
            toon,
        })
    }
}

/// Accepts a single character, or `\t` / `tab` spelled out for a tab.
fn parse_delimiter(raw: &str) -> Result<char> {
    if raw == "\\t" || raw.eq_ignore_ascii_case("tab") {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => bail!("Delimiter must be a single character, got '{raw}'"),
    }
}

/// Split the positional arguments into the query text and the input files.
///
/// With `--from-file` every positional is an input file. Otherwise the first
/// positional is the query, except that a lone argument naming an existing
/// file (and not starting like a path expression) is read with `.`.
fn resolve_query(cli: &Cli) -> Result<(String, Vec<PathBuf>)> {
    let mut positional: Vec<PathBuf> = cli
        .query
        .iter()
        .map(PathBuf::from)
        .chain(cli.files.iter().cloned())
        .collect();

    if let Some(path) = &cli.from_file {
        return Ok((read_query_file(path)?, positional));
    }

    let Some(query) = cli.query.as_deref() else {
        return Ok((".".to_string(), positional));
    };
    positional.remove(0);

    if positional.is_empty() && looks_like_input_file(query) {
        tracing::debug!(path = query, "treating lone argument as an input file");
        return Ok((".".to_string(), vec![PathBuf::from(query)]));
    }
    Ok((query.to_string(), positional))
}

fn looks_like_input_file(arg: &str) -> bool {
    !arg.starts_with('.') && !arg.starts_with('[') && Path::new(arg).is_file()
}

fn read_query_file(path: &Path) -> Result<String> {
    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        bail!(
            "Invalid query file path '{}': parent directory components are not allowed",
            path.display()
        );
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read query file: {}", path.display()))?;
    Ok(text.trim().to_string())
}
