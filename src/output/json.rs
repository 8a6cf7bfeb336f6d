use crate::errors::Result;
use crate::pipeline::Report;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct ReportOutput<'a> {
    pub version: &'static str,
    #[serde(flatten)]
    pub report: &'a Report,
    pub elapsed_ms: u64,
}

/// Write a finished run as pretty-printed JSON.
pub fn write_report_json<W: Write>(writer: &mut W, report: &Report, elapsed_ms: u64) -> Result<()> {
    let output = ReportOutput {
        version: env!("CARGO_PKG_VERSION"),
        report,
        elapsed_ms,
    };
    serde_json::to_writer_pretty(&mut *writer, &output)?;
    writeln!(writer)?;
    Ok(())
}
