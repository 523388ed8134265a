//! Output formatting module

mod json;
mod text;

use miette::Result;
use vvv_core::RunReport;

use crate::cli::OutputFormat;

pub fn output_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => json::output_json(report),
        OutputFormat::Text => {
            text::output_text(report);
            Ok(())
        }
    }
}

pub fn print_files(report: &RunReport) {
    text::output_files(report);
}
