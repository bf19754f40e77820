//! `tracevis` binary entry point: parse arguments, initialize logging,
//! dispatch to [`tracevis::run`].

use clap::Parser;
use tracevis::Cli;

fn main() {
    let cli = Cli::parse();
    let _guard = trace_infrastructure::logging::init(trace_infrastructure::logging::LogSink::StderrOnly, false);

    if let Err(err) = tracevis::run(&cli) {
        tracing::error!(%err, "command failed");
        std::process::exit(1);
    }
}
