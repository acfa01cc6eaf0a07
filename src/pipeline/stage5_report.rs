use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::SubjectResult;
use crate::pipeline::stage4_table::ResultTable;
use crate::report::json::{build_summary, render_summary_json};
use crate::report::{format_cell, format_flag};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub table: PathBuf,
    pub summary: Option<PathBuf>,
}

/// Both documents are rendered before anything touches disk; a failed
/// summary write removes the table so a failed run leaves no output.
pub fn write_reports(
    table: &ResultTable,
    subjects: &[SubjectResult],
    paths: &ReportPaths,
) -> Result<(), ReportError> {
    let csv = render_table_csv(table)?;
    let summary = match &paths.summary {
        Some(path) => Some((path, render_summary_json(&build_summary(table, subjects))?)),
        None => None,
    };

    write_document(&paths.table, csv.as_bytes())?;
    tracing::info!(path = %paths.table.display(), rows = table.rows.len(), "saved metrics");

    if let Some((path, json)) = summary {
        if let Err(err) = write_document(path, format!("{json}\n").as_bytes()) {
            let _ = fs::remove_file(&paths.table);
            return Err(err.into());
        }
        tracing::info!(path = %path.display(), "saved summary");
    }

    Ok(())
}

pub fn write_table<W: Write>(
    table: &ResultTable,
    writer: &mut csv::Writer<W>,
) -> Result<(), ReportError> {
    writer.write_record(table.header())?;
    for row in &table.rows {
        let mut record = Vec::with_capacity(table.metric_columns.len() + 5);
        record.push(row.reference.clone());
        record.push(row.prediction.clone());
        record.push(row.label.to_string());
        record.extend(row.values.iter().map(|&v| format_cell(v)));
        record.push(format_flag(row.empty_ref).to_string());
        record.push(format_flag(row.empty_pred).to_string());
        writer.write_record(&record)?;
    }
    Ok(())
}

pub fn render_table_csv(table: &ResultTable) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_table(table, &mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_document(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_report.rs"]
mod tests;
