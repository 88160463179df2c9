mod cli;
mod commands;
mod error;
mod model;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::error::ToolError;

const EXIT_UNEXPECTED: i32 = 2;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let tool = cli.command.tool_name();

    if let Err(err) = run(cli) {
        let message = failure_message(tool, &err);
        error!(tool, "{message}");
        for cause in err.chain().skip(1) {
            error!(tool, "{tool}: caused by: {cause}");
        }
        std::process::exit(exit_status(&err));
    }
}

/// `<tool>: <message>`, flagging failures that are not [`ToolError`]s.
fn failure_message(tool: &str, err: &anyhow::Error) -> String {
    match err.downcast_ref::<ToolError>() {
        Some(_) => format!("{tool}: {err}"),
        None => format!("{tool}: unexpected error: {err}"),
    }
}

fn exit_status(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ToolError>() {
        Some(tool_error) => tool_error.exit_code(),
        None => EXIT_UNEXPECTED,
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Compare(args) => commands::compare::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
