//! # vvv_plugin
//!
//! Plugin contract for the vvv validation runner.
//!
//! This crate provides:
//! - The `Plugin` capability trait implemented by every validator
//! - Per-plugin context and options handed over by the orchestrator
//! - `Finding` and `Severity` describing one reported problem
//! - The shared `Reporter` with its fail-fast cancellation signal
//! - Helpers validators compose: line scanning, binary detection,
//!   system dependency checks
//!
//! ## Example
//!
//! ```rust,ignore
//! use vvv_plugin::{Finding, Outcome, Plugin, PluginContext, PluginError, Reporter, SourceFile};
//!
//! struct NoFixme;
//!
//! impl Plugin for NoFixme {
//!     fn default_matchlist(&self) -> Vec<String> {
//!         vec!["*".to_string()]
//!     }
//!
//!     fn validate(
//!         &mut self,
//!         ctx: &PluginContext,
//!         file: &SourceFile,
//!         reporter: &Reporter,
//!     ) -> Result<Outcome, PluginError> {
//!         vvv_plugin::scan_lines(file, |line_number, line| {
//!             if line.contains("FIXME") {
//!                 reporter.report_detailed(
//!                     Finding::new(&ctx.id, &file.relative, "Line contains FIXME")
//!                         .with_line(line_number),
//!                 )?;
//!                 return Ok(true);
//!             }
//!             Ok(false)
//!         })
//!     }
//! }
//! ```

mod diagnostic;
mod error;
mod options;
mod plugin;
mod reporter;
mod source;
pub mod sysdeps;
mod text_line;

pub use diagnostic::{Finding, Severity};
pub use error::{Aborted, PluginError};
pub use options::PluginOptions;
pub use plugin::{Outcome, Plugin, PluginContext};
pub use reporter::{Entry, Reporter};
pub use source::{BINARY_PROBE_SIZE, SourceFile};
pub use text_line::scan_lines;
