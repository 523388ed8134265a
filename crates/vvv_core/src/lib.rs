//! # vvv_core
//!
//! Matching and dispatch core of the vvv validation runner.
//!
//! This crate provides:
//! - `MatchList`: ordered, negatable glob and regex patterns
//! - Tree walking that prunes excluded directories
//! - Loading of `validation-options.yaml` and `validation-files.yaml`
//! - The plugin registry and per-plugin lifecycle
//! - `Orchestrator`, which ties it all together into one run
//!
//! ## Example
//!
//! ```rust,ignore
//! use vvv_core::{Orchestrator, RunConfig};
//!
//! let report = Orchestrator::new(RunConfig::new().target("."))
//!     .run()
//!     .expect("configuration error");
//!
//! println!("{}", report.output);
//! std::process::exit(report.exit_code());
//! ```

pub mod config;
mod error;
mod matchlist;
mod orchestrator;
mod registry;
mod slot;
pub mod walker;

pub use error::VvvError;
pub use matchlist::{MatchList, NEGATION_PREFIX, Polarity, REGEX_PREFIX};
pub use orchestrator::{
    DispatchedFile, EXIT_CONFIG_ERROR, EXIT_SUCCESS, EXIT_VIOLATIONS, Orchestrator, RunConfig,
    RunReport,
};
pub use registry::{PluginFactory, PluginRegistry};
pub use slot::{Dispatch, PluginSettings, PluginSlot};
pub use walker::{Walk, is_whitelisted, walk, walk_from};

pub use vvv_plugin::{Entry, Finding, Reporter, Severity};
