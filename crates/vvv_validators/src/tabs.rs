//! tabs: Do not allow hard tabs in committed files.
//!
//! Use soft tabs and spaces instead. Makefiles require hard tabs and are
//! excluded by default.
//!
//! # Configuration
//!
//! No plugin specific options. To allow hard tabs in specific files list them
//! in `validation-files.yaml`:
//!
//! ```yaml
//! tabs: |
//!   *
//!   !Makefile
//!   !*.mk
//!   !*.tsv
//! ```

use vvv_plugin::{
    Finding, Outcome, Plugin, PluginContext, PluginError, Reporter, SourceFile, scan_lines,
};

const DEFAULT_HINT: &str = "Adjust your text editor settings to indent using spaces instead of hard tabs.\n\
Use a converter to convert existing tabs to spaces.\n\
http://dougneiner.com/post/641596410/tabs-vs-spaces";

/// Hard tab banisher.
#[derive(Debug, Default)]
pub struct TabsPlugin;

impl TabsPlugin {
    /// Creates the plugin.
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for TabsPlugin {
    fn default_matchlist(&self) -> Vec<String> {
        ["*", "!Makefile", "!*.mk", "!*.mak"]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    fn default_hint(&self) -> Option<String> {
        Some(DEFAULT_HINT.to_string())
    }

    fn validate(
        &mut self,
        ctx: &PluginContext,
        file: &SourceFile,
        reporter: &Reporter,
    ) -> Result<Outcome, PluginError> {
        scan_lines(file, |line_number, line| {
            let Some(byte_index) = line.find('\t') else {
                return Ok(false);
            };
            let column = line[..byte_index].chars().count() + 1;

            reporter.report_detailed(
                Finding::new(&ctx.id, &file.relative, "Line contains hard tabs")
                    .with_line(line_number)
                    .with_column(column)
                    .with_excerpt(line),
            )?;
            Ok(true)
        })
    }
}
