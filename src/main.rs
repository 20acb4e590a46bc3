mod cli;
mod logging;

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let ansi = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        _ => std::io::stderr().is_terminal(),
    };
    logging::setup_logger(cli.verbosity.tracing_level_filter(), ansi);

    match cli.cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
