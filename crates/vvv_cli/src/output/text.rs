//! Text output formatter

use tracing::info;
use vvv_core::RunReport;

pub fn output_text(report: &RunReport) {
    if !report.output.is_empty() {
        println!("{}", report.output);
    }

    let reporter = &report.reporter;
    let suffix = if report.aborted { " (aborted)" } else { "" };
    info!(
        "Checked {} files, found {} issues and {} internal errors{}",
        report.files.len(),
        reporter.entries().len() - reporter.internal_error_count(),
        reporter.internal_error_count(),
        suffix
    );
}

pub fn output_files(report: &RunReport) {
    for file in &report.files {
        if file.plugins.is_empty() {
            println!("{}", file.path);
        } else {
            println!("{}: {}", file.path, file.plugins.join(", "));
        }
    }
}
