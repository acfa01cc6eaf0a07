use std::collections::BTreeMap;

use thiserror::Error;

use crate::input::{InputError, SubjectPair, load_volume};
use crate::measures::{Metric, PairwiseMeasures};
use crate::model::{Label, SubjectResult, Volume};
use crate::pipeline::stage1_labels::discover_labels;
use crate::pipeline::stage2_masks::extract_mask;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(
        "the prediction and reference (ground truth) images must have the same shape; prediction has shape {prediction:?} and reference has shape {reference:?}"
    )]
    ShapeMismatch {
        reference: Vec<usize>,
        prediction: Vec<usize>,
    },
    #[error(transparent)]
    Input(#[from] InputError),
}

pub struct SubjectInputs<'a> {
    pub reference_id: &'a str,
    pub prediction_id: &'a str,
    pub reference: &'a Volume,
    pub prediction: &'a Volume,
    pub metrics: &'a [Metric],
    pub engine: &'a dyn PairwiseMeasures,
}

pub fn evaluate_subject(inputs: &SubjectInputs<'_>) -> Result<SubjectResult, EvalError> {
    let reference = inputs.reference;
    let prediction = inputs.prediction;
    if reference.shape() != prediction.shape() {
        return Err(EvalError::ShapeMismatch {
            reference: reference.shape().to_vec(),
            prediction: prediction.shape().to_vec(),
        });
    }

    let labels = discover_labels(reference, prediction);
    let mut records = BTreeMap::new();

    if labels.is_empty() {
        tracing::warn!(
            reference = inputs.reference_id,
            prediction = inputs.prediction_id,
            "both the reference and prediction are empty; evaluating whole volumes under label 0"
        );
        let record = inputs.engine.evaluate(
            &prediction.foreground_mask(),
            &reference.foreground_mask(),
            inputs.metrics,
        );
        records.insert(Label::BACKGROUND, record);
    } else {
        for label in labels {
            let prediction_mask = extract_mask(prediction, label);
            let reference_mask = extract_mask(reference, label);
            tracing::debug!(
                label = %label,
                n_ref = reference_mask.count(),
                n_pred = prediction_mask.count(),
                "processing label"
            );
            let record =
                inputs
                    .engine
                    .evaluate(&prediction_mask, &reference_mask, inputs.metrics);
            records.insert(label, record);
        }
    }

    Ok(SubjectResult {
        reference: inputs.reference_id.to_string(),
        prediction: inputs.prediction_id.to_string(),
        records,
    })
}

/// Loads one subject pair and evaluates it. Volumes are dropped on return.
pub fn evaluate_pair(
    pair: &SubjectPair,
    metrics: &[Metric],
    engine: &dyn PairwiseMeasures,
) -> Result<SubjectResult, EvalError> {
    let prediction = load_volume(&pair.prediction)?;
    let reference = load_volume(&pair.reference)?;
    let reference_id = pair.reference.display().to_string();
    let prediction_id = pair.prediction.display().to_string();

    evaluate_subject(&SubjectInputs {
        reference_id: &reference_id,
        prediction_id: &prediction_id,
        reference: &reference,
        prediction: &prediction,
        metrics,
        engine,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_subject.rs"]
mod tests;
