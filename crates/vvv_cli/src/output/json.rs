//! JSON output formatter

use miette::{IntoDiagnostic, Result};
use vvv_core::RunReport;

pub fn output_json(report: &RunReport) -> Result<()> {
    let output = serde_json::json!({
        "project_root": report.project_root.display().to_string(),
        "files": report.files,
        "entries": report.reporter.entries(),
        "hints": report.reporter.hints(),
        "aborted": report.aborted,
        "exit_code": report.exit_code(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
