//! linelength: Check that text file lines are not too long.
//!
//! Built-in, no external software needed. Line length is counted in
//! characters, excluding the line terminator.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | length | integer | 80 | Maximum allowed line length |
//!
//! # Example
//!
//! ```yaml
//! # Allow long text lines
//! linelength:
//!   length: 250
//! ```

use vvv_plugin::{
    Finding, Outcome, Plugin, PluginContext, PluginError, PluginOptions, Reporter, SourceFile,
    scan_lines,
};

/// Default maximum line length.
pub const DEFAULT_LENGTH: u64 = 80;

/// Line length driver.
#[derive(Debug)]
pub struct LineLengthPlugin {
    line_length: usize,
}

impl LineLengthPlugin {
    /// Creates the plugin with the default limit.
    pub fn new() -> Self {
        Self {
            line_length: DEFAULT_LENGTH as usize,
        }
    }

    /// Returns the configured limit.
    pub fn line_length(&self) -> usize {
        self.line_length
    }
}

impl Default for LineLengthPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for LineLengthPlugin {
    fn default_matchlist(&self) -> Vec<String> {
        vec!["*".to_string()]
    }

    fn setup(&mut self, _ctx: &PluginContext, options: &PluginOptions) -> Result<(), PluginError> {
        let length = options.get_int("length", DEFAULT_LENGTH)?;
        if length == 0 {
            return Err(PluginError::config("linelength.length must be positive"));
        }
        self.line_length = usize::try_from(length)
            .map_err(|_| PluginError::config("linelength.length is too large"))?;
        Ok(())
    }

    fn default_hint(&self) -> Option<String> {
        Some(format!(
            "Text file line length must not exceed {} characters per line",
            self.line_length
        ))
    }

    fn validate(
        &mut self,
        ctx: &PluginContext,
        file: &SourceFile,
        reporter: &Reporter,
    ) -> Result<Outcome, PluginError> {
        let limit = self.line_length;
        scan_lines(file, |line_number, line| {
            let length = line.chars().count();
            if length <= limit {
                return Ok(false);
            }

            reporter.report_detailed(
                Finding::new(
                    &ctx.id,
                    &file.relative,
                    format!("Line is too long, {} characters", length),
                )
                .with_line(line_number)
                .with_excerpt(line),
            )?;
            Ok(true)
        })
    }
}
