use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use recordbook_xlsx::{CellValue, RecordTable, WriteOptions};

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(about = "Write and dump single-sheet XLSX record tables.")]
struct Args {
    /// Log at debug level (`RUST_LOG` takes precedence when set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the headers and rows of the first worksheet.
    Dump {
        file: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the dump to this file (replaced atomically) instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Write a table read from a JSON file (`{"headers": [...], "rows": [[...], ...]}`).
    Write {
        target: PathBuf,

        /// JSON input; cells may be strings, numbers or null.
        #[arg(long)]
        input: PathBuf,

        /// Store this column's values as text even when they look numeric (repeatable).
        #[arg(long = "force-string")]
        force_string: Vec<String>,

        /// Replace the target without copying it to a timestamped backup first.
        #[arg(long)]
        no_backup: bool,

        /// Creator recorded in the document properties.
        #[arg(long)]
        creator: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct InputTable {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<CellValue>>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Dump {
            file,
            format,
            output,
        } => {
            let table = recordbook_xlsx::read(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let mut buf = Vec::new();
            match format {
                OutputFormat::Text => print_text(&mut buf, &table)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut buf, &table)?;
                    writeln!(buf)?;
                }
            }
            match output {
                Some(path) => recordbook_fs::atomic_write_bytes(&path, &buf)
                    .with_context(|| format!("write {}", path.display()))?,
                None => std::io::stdout().lock().write_all(&buf)?,
            }
        }
        Command::Write {
            target,
            input,
            force_string,
            no_backup,
            creator,
        } => {
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("read {}", input.display()))?;
            let table: InputTable = serde_json::from_str(&raw)
                .with_context(|| format!("parse {}", input.display()))?;

            let mut options = force_string
                .into_iter()
                .fold(WriteOptions::default(), |options, header| options.force_string(header))
                .with_backup(!no_backup);
            if let Some(creator) = creator {
                options = options.with_creator(creator);
            }
            let written =
                recordbook_xlsx::write_with_options(&target, &table.headers, &table.rows, &options)
                    .with_context(|| format!("write {}", target.display()))?;
            println!("{written}");
        }
    }

    Ok(())
}

fn print_text(out: &mut impl Write, table: &RecordTable) -> std::io::Result<()> {
    writeln!(out, "{}", table.headers.join("\t"))?;
    for row in &table.rows {
        writeln!(out, "{}", row.join("\t"))?;
    }
    Ok(())
}
