//! pdb: Do not allow Python debugger breakpoints in committed files.
//!
//! E.g. this will fail:
//!
//! ```python
//! def foo(self):
//!     import pdb ; pdb.set_trace()
//! ```
//!
//! `pdb.set_trace()`, `ipdb.set_trace()` and the `breakpoint()` builtin are
//! matched in uncommented lines.
//!
//! # Configuration
//!
//! No options.

use vvv_plugin::{
    Finding, Outcome, Plugin, PluginContext, PluginError, Reporter, SourceFile, scan_lines,
};

const BREAKPOINT_CALLS: &[&str] = &["pdb.set_trace(", "breakpoint("];

/// Python breakpoint finder.
#[derive(Debug, Default)]
pub struct PdbPlugin;

impl PdbPlugin {
    /// Creates the plugin.
    pub fn new() -> Self {
        Self
    }
}

/// Returns the breakpoint call found in `line`, ignoring comments.
fn find_breakpoint(line: &str) -> Option<&'static str> {
    let code = line.split('#').next().unwrap_or_default();
    BREAKPOINT_CALLS.iter().copied().find(|call| {
        code.match_indices(call).any(|(index, _)| {
            // `breakpoint(` must not be the tail of a longer identifier
            // such as `set_breakpoint(`; `ipdb.set_trace(` is still caught.
            *call == "pdb.set_trace("
                || !code[..index]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        })
    })
}

impl Plugin for PdbPlugin {
    fn default_matchlist(&self) -> Vec<String> {
        vec!["*.py".to_string()]
    }

    fn default_hint(&self) -> Option<String> {
        Some("Remove Python debugger breakpoints before committing.".to_string())
    }

    fn validate(
        &mut self,
        ctx: &PluginContext,
        file: &SourceFile,
        reporter: &Reporter,
    ) -> Result<Outcome, PluginError> {
        scan_lines(file, |line_number, line| {
            let Some(call) = find_breakpoint(line) else {
                return Ok(false);
            };

            reporter.report_detailed(
                Finding::new(
                    &ctx.id,
                    &file.relative,
                    format!("Line contains a debugger breakpoint: {})", call),
                )
                .with_line(line_number)
                .with_excerpt(line),
            )?;
            Ok(true)
        })
    }
}
