//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use vvv_core::RunConfig;

/// vvv - validate all files in a project
#[derive(Parser, Debug)]
#[command(name = "vvv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to validate
    #[arg(default_value = ".")]
    pub targets: Vec<PathBuf>,

    /// Project root (default: nearest directory with a configuration file)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Validator options file
    #[arg(short = 'c', long = "options")]
    pub options: Option<PathBuf>,

    /// File patterns file
    #[arg(short, long)]
    pub files: Option<PathBuf>,

    /// Where validators install their tooling (default: <project>/.vvv)
    #[arg(short, long)]
    pub installation: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Remove and reinstall validator tooling
    #[arg(long)]
    pub reinstall: bool,

    /// Stop at the first reported problem
    #[arg(short = 's', long, visible_alias = "abort-on-first-error")]
    pub suicidal: bool,

    /// Print every checked file and the validators that ran on it
    #[arg(long)]
    pub print_files: bool,

    /// Log why each ignored path was ignored
    #[arg(long)]
    pub debug_matching: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Log level selected by `--verbose` and `--quiet`.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            targets: self.targets.clone(),
            project: self.project.clone(),
            options_file: self.options.clone(),
            files_file: self.files.clone(),
            installation: self.installation.clone(),
            reinstall: self.reinstall,
            abort_on_first_error: self.suicidal,
            debug_matching: self.debug_matching,
        }
    }
}
