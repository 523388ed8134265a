//! evilspace: Make sure text files do not contain the no-break space.
//!
//! ALT + spacebar (OPTION + spacebar on macOS) inserts U+00A0, which looks
//! exactly like a normal space. Many compilers, linters and minifiers choke
//! on it in interesting ways.
//!
//! # Configuration
//!
//! No options.

use vvv_plugin::{
    Finding, Outcome, Plugin, PluginContext, PluginError, Reporter, SourceFile, scan_lines,
};

const VERY_EVIL_SPACE: char = '\u{a0}';

/// No-break space buster.
#[derive(Debug, Default)]
pub struct EvilSpacePlugin;

impl EvilSpacePlugin {
    /// Creates the plugin.
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for EvilSpacePlugin {
    fn default_matchlist(&self) -> Vec<String> {
        vec!["*".to_string()]
    }

    fn default_hint(&self) -> Option<String> {
        Some("Detected non-breaking spacebar characters in files".to_string())
    }

    fn validate(
        &mut self,
        ctx: &PluginContext,
        file: &SourceFile,
        reporter: &Reporter,
    ) -> Result<Outcome, PluginError> {
        scan_lines(file, |line_number, line| {
            let Some(byte_index) = line.find(VERY_EVIL_SPACE) else {
                return Ok(false);
            };

            reporter.report_detailed(
                Finding::new(
                    &ctx.id,
                    &file.relative,
                    "Line contains non-breaking space character (alt+spacebar)",
                )
                .with_line(line_number)
                .with_column(line[..byte_index].chars().count() + 1)
                .with_excerpt(line),
            )?;
            Ok(true)
        })
    }
}
