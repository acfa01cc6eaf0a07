use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Label, SubjectResult};
use crate::pipeline::stage4_table::ResultTable;
use crate::report::{mean, median};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub tool: String,
    pub version: String,
    pub n_subjects: usize,
    pub n_degenerate_subjects: usize,
    pub n_rows: usize,
    pub metrics: Vec<String>,
    pub labels: Vec<LabelSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LabelSummary {
    pub label: f64,
    pub n_rows: usize,
    pub n_empty_ref: usize,
    pub n_empty_pred: usize,
    pub metrics: BTreeMap<String, MetricStats>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricStats {
    pub n_finite: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

pub fn build_summary(table: &ResultTable, subjects: &[SubjectResult]) -> Summary {
    let mut by_label: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
    for (idx, row) in table.rows.iter().enumerate() {
        by_label.entry(row.label).or_default().push(idx);
    }

    let mut labels = Vec::with_capacity(by_label.len());
    for (label, idxs) in by_label {
        let mut metrics = BTreeMap::new();
        for (col, metric) in table.metric_columns.iter().enumerate() {
            let values = idxs
                .iter()
                .filter_map(|&i| table.rows[i].values[col])
                .collect::<Vec<_>>();
            metrics.insert(
                metric.name().to_string(),
                MetricStats {
                    n_finite: values.iter().filter(|v| v.is_finite()).count(),
                    mean: mean(&values),
                    median: median(&values),
                },
            );
        }
        labels.push(LabelSummary {
            label: label.value(),
            n_rows: idxs.len(),
            n_empty_ref: idxs.iter().filter(|&&i| table.rows[i].empty_ref).count(),
            n_empty_pred: idxs.iter().filter(|&&i| table.rows[i].empty_pred).count(),
            metrics,
        });
    }

    Summary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        n_subjects: subjects.len(),
        n_degenerate_subjects: subjects.iter().filter(|s| s.is_degenerate()).count(),
        n_rows: table.rows.len(),
        metrics: table
            .metric_columns
            .iter()
            .map(|m| m.name().to_string())
            .collect(),
        labels,
    }
}

pub fn render_summary_json(summary: &Summary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}
