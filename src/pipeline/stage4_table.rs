use crate::measures::Metric;
use crate::model::{Label, SubjectResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub reference: String,
    pub prediction: String,
    pub label: Label,
    /// Aligned with `ResultTable::metric_columns`; `None` when the record
    /// did not carry that metric.
    pub values: Vec<Option<f64>>,
    pub empty_ref: bool,
    pub empty_pred: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    pub metric_columns: Vec<Metric>,
    pub rows: Vec<TableRow>,
}

impl ResultTable {
    pub fn header(&self) -> Vec<String> {
        let mut out = vec![
            "reference".to_string(),
            "prediction".to_string(),
            "label".to_string(),
        ];
        out.extend(self.metric_columns.iter().map(|m| m.name().to_string()));
        out.push("EmptyRef".to_string());
        out.push("EmptyPred".to_string());
        out
    }
}

/// Flattens subject results into rows: subjects in the given order, labels
/// ascending within a subject. Metric columns are the union of every record's
/// metrics in first-seen order.
pub fn build_table(subjects: &[SubjectResult]) -> ResultTable {
    let mut metric_columns: Vec<Metric> = Vec::new();
    for subject in subjects {
        for record in subject.records.values() {
            for metric in record.metrics() {
                if !metric_columns.contains(&metric) {
                    metric_columns.push(metric);
                }
            }
        }
    }

    let n_rows = subjects.iter().map(|s| s.records.len()).sum();
    let mut rows = Vec::with_capacity(n_rows);
    for subject in subjects {
        for (&label, record) in &subject.records {
            let values = metric_columns.iter().map(|&m| record.get(m)).collect();
            rows.push(TableRow {
                reference: subject.reference.clone(),
                prediction: subject.prediction.clone(),
                label,
                values,
                empty_ref: record.empty_ref,
                empty_pred: record.empty_pred,
            });
        }
    }

    ResultTable {
        metric_columns,
        rows,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_table.rs"]
mod tests;
