use std::collections::BTreeSet;

use crate::model::{Label, Volume};

/// Foreground labels present in either volume, ascending.
pub fn discover_labels(reference: &Volume, prediction: &Volume) -> BTreeSet<Label> {
    let mut labels = unique_labels(reference);
    labels.extend(unique_labels(prediction));
    labels
}

pub fn unique_labels(volume: &Volume) -> BTreeSet<Label> {
    volume
        .data()
        .iter()
        .filter_map(|&v| Label::from_voxel(v))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_labels.rs"]
mod tests;
