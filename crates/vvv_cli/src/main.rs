//! vvv CLI
//!
//! Validates every file in a project with the configured validators.

use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;
use vvv_core::{EXIT_CONFIG_ERROR, Orchestrator};

mod cli;
mod output;

use cli::{Cli, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log_level()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(EXIT_CONFIG_ERROR as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let report = Orchestrator::new(cli.run_config())
        .run()
        .into_diagnostic()?;

    if cli.print_files && cli.format == OutputFormat::Text {
        output::print_files(&report);
    }
    output::output_report(&report, cli.format)?;

    u8::try_from(report.exit_code())
        .map_err(|_| miette::miette!("Exit code {} out of range", report.exit_code()))
}
