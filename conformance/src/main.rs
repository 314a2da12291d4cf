//! Conformance validator for emotional-state model implementations.
//!
//! Replays the JSON test vectors against an implementation process, prints a
//! per-vector verdict, and writes `conformance-report.json`.

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use conformance::{exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "conformance",
    version,
    about = "Conformance validator for emotional-state model implementations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every vector against an implementation and write the report.
    Validate {
        /// Executable speaking the conformance line protocol on stdin/stdout.
        implementation: PathBuf,
        /// Vector file (default from config: `test-vectors/test-vectors.json`).
        #[arg(long)]
        vectors: Option<PathBuf>,
        /// Report output path (default: `conformance-report.json`).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Config file (default: `conformance.toml` if present).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Arguments passed through to the implementation.
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Print the id and name of every vector.
    List {
        #[arg(long)]
        vectors: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Validate {
            implementation,
            vectors,
            report,
            config,
            args,
        } => cli::validate(&cli::ValidateArgs {
            implementation,
            implementation_args: args,
            vectors,
            report,
            config,
        }),
        Command::List { vectors, config } => {
            cli::list_vectors(config.as_deref(), vectors.as_deref())?;
            Ok(exit_codes::OK)
        }
    }
}
