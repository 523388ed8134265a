//! Line-scanning helper for validators that work on text lines.

use std::fs;

use tracing::warn;

use crate::{Outcome, PluginError, SourceFile};

/// Calls `check` for every line of `file`.
///
/// `check` receives the 1-based line number and the line without its
/// terminator, and returns `true` if it reported a problem on that line.
/// Files that are not valid UTF-8 are skipped with a warning and pass.
pub fn scan_lines<F>(file: &SourceFile, mut check: F) -> Result<Outcome, PluginError>
where
    F: FnMut(usize, &str) -> Result<bool, PluginError>,
{
    let bytes = fs::read(&file.path)?;
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            warn!("Bad encoding: {} ({})", file.relative, e.utf8_error());
            return Ok(Outcome::Passed);
        }
    };

    let mut failed = false;
    for (index, line) in content.lines().enumerate() {
        if check(index + 1, line)? {
            failed = true;
        }
    }

    Ok(if failed {
        Outcome::Failed
    } else {
        Outcome::Passed
    })
}
