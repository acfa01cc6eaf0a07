use std::collections::BTreeMap;

use crate::measures::Metric;
use crate::model::label::Label;

/// Scalar results for one prediction/reference mask pair, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub values: Vec<(Metric, f64)>,
    pub empty_ref: bool,
    pub empty_pred: bool,
}

impl MetricRecord {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|&(_, v)| v)
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.values.iter().map(|&(m, _)| m)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectResult {
    pub reference: String,
    pub prediction: String,
    pub records: BTreeMap<Label, MetricRecord>,
}

impl SubjectResult {
    /// Whole-volume evaluation stored under the background key.
    pub fn is_degenerate(&self) -> bool {
        self.records.keys().any(|l| l.is_background())
    }
}
