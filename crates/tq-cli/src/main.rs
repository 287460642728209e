//! `tq` CLI: query and convert JSON, YAML and TOON from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Query a TOON file
//! tq '.users[0].name' data.toon
//!
//! # Convert JSON to TOON (the default output format)
//! tq data.json
//!
//! # Filter, then print JSON
//! echo '{"users":[{"name":"Alice","age":30}]}' | tq -o json '.users[] | select(.age > 25)'
//!
//! # Raw strings, one per line
//! tq -r '.users[].name' data.json
//!
//! # Compare token usage of JSON and TOON
//! tq --stats data.json
//! ```

mod config;
mod convert;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use config::{Config, InputFormat, OutputFormat, DEFAULT_MAX_INPUT_SIZE};
use convert::TokenStats;

#[derive(Parser)]
#[command(
    name = "tq",
    version,
    about = "Query and convert JSON, YAML and TOON (Token-Oriented Object Notation)",
    after_help = "With no query, `.` is used. A single argument that names an existing file is read as input."
)]
struct Cli {
    /// Query expression (defaults to `.`)
    query: Option<String>,

    /// Input files (reads from stdin if omitted)
    files: Vec<PathBuf>,

    /// Input format
    #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
    input_format: InputFormat,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Toon)]
    output_format: OutputFormat,

    /// Print strings without quoting
    #[arg(short, long)]
    raw_output: bool,

    /// Single-line JSON output
    #[arg(short, long)]
    compact_output: bool,

    /// Read every input document into one array
    #[arg(short, long)]
    slurp: bool,

    /// Use `null` as the single input and read nothing
    #[arg(short, long)]
    null_input: bool,

    /// Exit with status 1 when the last output is null, false or missing
    #[arg(short, long)]
    exit_status: bool,

    /// Read the query from a file; every positional argument is then an input file
    #[arg(short, long, value_name = "FILE")]
    from_file: Option<PathBuf>,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Indent with tabs
    #[arg(long)]
    tab: bool,

    /// TOON delimiter: ',', '|', ';' or tab
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Print JSON vs TOON token estimates to stderr
    #[arg(long)]
    stats: bool,

    /// Largest accepted input, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_INPUT_SIZE)]
    max_input_size: u64,

    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = Config::from_cli(cli)?;
    tracing::debug!(query = %config.query, files = config.files.len(), "starting");

    let expr = tq_core::parse(&config.query).context("Invalid query")?;
    let inputs = convert::read_inputs(&config).context("Failed to read input")?;
    tracing::info!(documents = inputs.len(), "input loaded");

    let mut stats = config.stats.then(TokenStats::default);
    let mut out = BufWriter::new(io::stdout().lock());
    let mut last = None;

    for input in &inputs {
        let outputs = tq_core::evaluate(&expr, input).context("Query failed")?;
        for value in outputs {
            let text = convert::render(&value, &config)?;
            out.write_all(text.as_bytes())
                .context("Failed to write output")?;
            if !text.ends_with('\n') {
                out.write_all(b"\n").context("Failed to write output")?;
            }
            if let Some(stats) = stats.as_mut() {
                stats.record(&value, &config.toon)?;
            }
            last = Some(value);
        }
    }
    out.flush().context("Failed to write output")?;

    if let Some(stats) = &stats {
        eprint!("{}", stats.report());
    }

    if config.exit_status && !last.is_some_and(|value| value.is_truthy()) {
        tracing::debug!("last output is falsy, exiting with status 1");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
