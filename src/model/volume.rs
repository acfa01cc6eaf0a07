use thiserror::Error;

use crate::model::label::Label;

#[derive(Debug, Error, PartialEq)]
pub enum VolumeError {
    #[error("volume must have at least one dimension")]
    NoDimensions,
    #[error("data length {len} does not match shape {shape:?} ({expected} voxels)")]
    DataLength {
        shape: Vec<usize>,
        expected: usize,
        len: usize,
    },
    #[error("spacing has {got} entries but volume has {ndim} dimensions")]
    SpacingRank { ndim: usize, got: usize },
}

/// Dense N-D label image. Voxels are stored with the first axis varying
/// fastest, the order NIfTI uses on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    shape: Vec<usize>,
    spacing: Vec<f64>,
    data: Vec<f64>,
}

impl Volume {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, VolumeError> {
        check_shape(&shape, data.len())?;
        let spacing = vec![1.0; shape.len()];
        Ok(Self {
            shape,
            spacing,
            data,
        })
    }

    #[cfg(test)]
    pub fn zeros(shape: Vec<usize>) -> Result<Self, VolumeError> {
        let len = shape.iter().product();
        Self::new(shape, vec![0.0; len])
    }

    pub fn with_spacing(mut self, spacing: Vec<f64>) -> Result<Self, VolumeError> {
        if spacing.len() != self.shape.len() {
            return Err(VolumeError::SpacingRank {
                ndim: self.shape.len(),
                got: spacing.len(),
            });
        }
        self.spacing = spacing;
        Ok(self)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mask of every non-zero voxel, used when a pair has no labels at all.
    pub fn foreground_mask(&self) -> BinaryMask {
        let voxels = self
            .data
            .iter()
            .map(|&v| Label::from_voxel(v).is_some())
            .collect();
        BinaryMask::from_parts(self.shape.clone(), self.spacing.clone(), voxels)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    shape: Vec<usize>,
    spacing: Vec<f64>,
    voxels: Vec<bool>,
}

impl BinaryMask {
    #[cfg(test)]
    pub fn new(shape: Vec<usize>, voxels: Vec<bool>) -> Result<Self, VolumeError> {
        check_shape(&shape, voxels.len())?;
        let spacing = vec![1.0; shape.len()];
        Ok(Self::from_parts(shape, spacing, voxels))
    }

    pub(crate) fn from_parts(shape: Vec<usize>, spacing: Vec<f64>, voxels: Vec<bool>) -> Self {
        Self {
            shape,
            spacing,
            voxels,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    pub fn voxels(&self) -> &[bool] {
        &self.voxels
    }

    pub fn count(&self) -> usize {
        self.voxels.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.voxels.iter().any(|&v| v)
    }
}

/// Linear-index strides for a first-axis-fastest layout.
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(shape.len());
    let mut acc = 1usize;
    for &dim in shape {
        out.push(acc);
        acc *= dim;
    }
    out
}

fn check_shape(shape: &[usize], len: usize) -> Result<(), VolumeError> {
    if shape.is_empty() {
        return Err(VolumeError::NoDimensions);
    }
    let expected = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .unwrap_or(usize::MAX);
    if expected != len {
        return Err(VolumeError::DataLength {
            shape: shape.to_vec(),
            expected,
            len,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/volume.rs"]
mod tests;
