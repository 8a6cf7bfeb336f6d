use crate::errors::Result;
use crate::pipeline::{Outcome, Report};
use std::io::Write;

/// Write a finished run as human-readable text.
pub fn write_report_text<W: Write>(writer: &mut W, report: &Report) -> Result<()> {
    writeln!(writer, "Source:     {}", report.source.display())?;
    writeln!(writer, "Manifest:   {}", report.manifest_path.display())?;
    if report.files_failed > 0 {
        writeln!(
            writer,
            "Parsed:     {} files ({} failed)",
            report.files_parsed, report.files_failed
        )?;
    } else {
        writeln!(writer, "Parsed:     {} files", report.files_parsed)?;
    }
    writeln!(writer, "Candidates: {}", report.candidates.len())?;
    writeln!(writer)?;

    if !report.dependencies.is_empty() {
        writeln!(writer, "Pinned")?;
        writeln!(writer, "------")?;
        for dep in &report.dependencies {
            writeln!(writer, "{}=={}", dep.name, dep.version)?;
        }
        writeln!(writer)?;
    }

    if !report.warnings.is_empty() {
        writeln!(writer, "Warnings")?;
        writeln!(writer, "--------")?;
        for warning in &report.warnings {
            writeln!(writer, "{warning}")?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", outcome_line(report))?;
    Ok(())
}

/// One-line summary of how the run ended.
pub fn outcome_line(report: &Report) -> String {
    match &report.outcome {
        Outcome::Written { path, count } => {
            let noun = if *count == 1 { "pin" } else { "pins" };
            format!("Wrote {count} {noun} to {}", path.display())
        }
        Outcome::DryRun => "Dry run: manifest not written".to_string(),
        Outcome::NoSourceFiles => {
            format!("No source files found under {}", report.source.display())
        }
        Outcome::NoDependencies => "No third-party dependencies to pin".to_string(),
        Outcome::OverwriteDeclined { path } => {
            format!("Kept existing {}; nothing written", path.display())
        }
        Outcome::Cancelled => "Cancelled; nothing written".to_string(),
    }
}
