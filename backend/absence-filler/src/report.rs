// src/report.rs
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

use crate::filler::FillSummary;

#[derive(Debug, Serialize)]
struct ReportRow {
    date: String,
    outcome: &'static str,
    detail: String,
}

/// Writes one `date,outcome,detail` row per processed date.
pub fn write_report<W: io::Write>(summary: &FillSummary, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (day, outcome) in &summary.outcomes {
        csv_writer.serialize(ReportRow {
            date: day.format("%Y-%m-%d").to_string(),
            outcome: outcome.label(),
            detail: outcome.detail(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_report(summary: &FillSummary, path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_report(summary, file)?;
    info!("Report with {} row(s) written to {:?}", summary.outcomes.len(), path);
    Ok(())
}
