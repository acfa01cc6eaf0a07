use crate::model::{BinaryMask, Label, Volume};

pub fn extract_mask(volume: &Volume, label: Label) -> BinaryMask {
    let target = label.value();
    let voxels = volume.data().iter().map(|&v| v == target).collect();
    BinaryMask::from_parts(volume.shape().to_vec(), volume.spacing().to_vec(), voxels)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_masks.rs"]
mod tests;
