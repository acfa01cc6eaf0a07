//! Pairwise comparison of one prediction mask against one reference mask.
//!
//! The evaluator only talks to [`PairwiseMeasures`]; [`BinaryPairwiseMeasures`]
//! is the engine the CLI runs with.

pub mod distance;
pub mod overlap;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{BinaryMask, MetricRecord};
use distance::SurfaceDistances;
use overlap::Confusion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Dsc,
    Fbeta,
    Iou,
    Nsd,
    Hd,
    HdPerc,
    Masd,
    Assd,
    VolDiff,
    RelVolDiff,
}

pub const DEFAULT_METRICS: &[Metric] = &[
    Metric::Dsc,
    Metric::Fbeta,
    Metric::Nsd,
    Metric::VolDiff,
    Metric::RelVolDiff,
];

impl Metric {
    pub fn all() -> &'static [Metric] {
        &[
            Metric::Dsc,
            Metric::Fbeta,
            Metric::Iou,
            Metric::Nsd,
            Metric::Hd,
            Metric::HdPerc,
            Metric::Masd,
            Metric::Assd,
            Metric::VolDiff,
            Metric::RelVolDiff,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Dsc => "dsc",
            Metric::Fbeta => "fbeta",
            Metric::Iou => "iou",
            Metric::Nsd => "nsd",
            Metric::Hd => "hd",
            Metric::HdPerc => "hd_perc",
            Metric::Masd => "masd",
            Metric::Assd => "assd",
            Metric::VolDiff => "vol_diff",
            Metric::RelVolDiff => "rel_vol_diff",
        }
    }

    pub fn is_surface_based(self) -> bool {
        matches!(
            self,
            Metric::Nsd | Metric::Hd | Metric::HdPerc | Metric::Masd | Metric::Assd
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::all()
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| MetricError::Unrecognized(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MetricError {
    #[error("unrecognized metric: {0} (known: {known})", known = known_metric_names())]
    Unrecognized(String),
    #[error("no metrics requested")]
    Empty,
    #[error("invalid measure parameter: {0}")]
    InvalidParameter(String),
}

fn known_metric_names() -> String {
    Metric::all()
        .iter()
        .map(|m| m.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses a user metric list. Duplicates keep their first position.
pub fn parse_metric_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Metric>, MetricError> {
    if names.is_empty() {
        return Err(MetricError::Empty);
    }
    let mut out: Vec<Metric> = Vec::with_capacity(names.len());
    for name in names {
        let metric = name.as_ref().trim().parse::<Metric>()?;
        if !out.contains(&metric) {
            out.push(metric);
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureParams {
    pub fbeta_beta: f64,
    pub nsd_tau: f64,
    pub hd_percentile: f64,
    pub use_spacing: bool,
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            fbeta_beta: 1.0,
            nsd_tau: 1.0,
            hd_percentile: 95.0,
            use_spacing: false,
        }
    }
}

impl MeasureParams {
    pub fn validate(&self) -> Result<(), MetricError> {
        if !self.fbeta_beta.is_finite() || self.fbeta_beta < 0.0 {
            return Err(MetricError::InvalidParameter(format!(
                "fbeta beta must be finite and >= 0, got {}",
                self.fbeta_beta
            )));
        }
        if !self.nsd_tau.is_finite() || self.nsd_tau < 0.0 {
            return Err(MetricError::InvalidParameter(format!(
                "nsd tau must be finite and >= 0, got {}",
                self.nsd_tau
            )));
        }
        if !(0.0..=100.0).contains(&self.hd_percentile) {
            return Err(MetricError::InvalidParameter(format!(
                "hd percentile must be within [0, 100], got {}",
                self.hd_percentile
            )));
        }
        Ok(())
    }
}

pub trait PairwiseMeasures {
    fn evaluate(
        &self,
        prediction: &BinaryMask,
        reference: &BinaryMask,
        metrics: &[Metric],
    ) -> MetricRecord;
}

#[derive(Debug, Clone, Default)]
pub struct BinaryPairwiseMeasures {
    params: MeasureParams,
}

impl BinaryPairwiseMeasures {
    pub fn new(params: MeasureParams) -> Result<Self, MetricError> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl PairwiseMeasures for BinaryPairwiseMeasures {
    fn evaluate(
        &self,
        prediction: &BinaryMask,
        reference: &BinaryMask,
        metrics: &[Metric],
    ) -> MetricRecord {
        let confusion = Confusion::from_masks(prediction, reference);
        let surfaces = if metrics.iter().any(|m| m.is_surface_based()) {
            let spacing = if self.params.use_spacing {
                reference.spacing().to_vec()
            } else {
                vec![1.0; reference.shape().len()]
            };
            Some(SurfaceDistances::compute(prediction, reference, &spacing))
        } else {
            None
        };

        let mut values = Vec::with_capacity(metrics.len());
        for &metric in metrics {
            let value = match metric {
                Metric::Dsc => confusion.dsc(),
                Metric::Fbeta => confusion.fbeta(self.params.fbeta_beta),
                Metric::Iou => confusion.iou(),
                Metric::VolDiff => confusion.vol_diff(),
                Metric::RelVolDiff => confusion.rel_vol_diff(),
                Metric::Nsd => surface_value(&surfaces, |s| s.nsd(self.params.nsd_tau)),
                Metric::Hd => surface_value(&surfaces, SurfaceDistances::hd),
                Metric::HdPerc => {
                    surface_value(&surfaces, |s| s.hd_perc(self.params.hd_percentile))
                }
                Metric::Masd => surface_value(&surfaces, SurfaceDistances::masd),
                Metric::Assd => surface_value(&surfaces, SurfaceDistances::assd),
            };
            values.push((metric, value));
        }

        MetricRecord {
            values,
            empty_ref: confusion.n_ref == 0,
            empty_pred: confusion.n_pred == 0,
        }
    }
}

fn surface_value(
    surfaces: &Option<SurfaceDistances>,
    f: impl Fn(&SurfaceDistances) -> f64,
) -> f64 {
    surfaces.as_ref().map(f).unwrap_or(f64::NAN)
}

#[cfg(test)]
#[path = "../../tests/src_inline/measures/mod.rs"]
mod tests;
