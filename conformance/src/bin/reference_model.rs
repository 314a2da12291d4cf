//! Reference state model served over the conformance line protocol.
//!
//! Used by the integration tests to exercise the process adapter and the
//! CLI end to end.

use std::io;

use clap::Parser;

use conformance::io::protocol::serve;
use conformance::test_support::{ReferenceModel, reference_info};

#[derive(Parser)]
#[command(name = "reference-model", about = "Reference model for conformance tests")]
struct Args {
    /// Do not advertise native `advance_time`.
    #[arg(long)]
    without_advance_time: bool,
    /// Never answer when this event is processed.
    #[arg(long)]
    hang_on: Option<String>,
    /// Exit with a message on stderr instead of serving.
    #[arg(long)]
    crash: bool,
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    if args.crash {
        eprintln!("reference-model: crashing on request");
        std::process::exit(3);
    }
    let mut model = ReferenceModel::new(!args.without_advance_time);
    if let Some(event) = &args.hang_on {
        model = model.hanging_on(event);
    }
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&reference_info(), &mut model, stdin.lock(), stdout.lock())
}
