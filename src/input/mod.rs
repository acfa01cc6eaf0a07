use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod nifti;

use crate::model::{Volume, VolumeError};
use nifti::read_nifti;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: file {} does not exist", .0.display())]
    MissingInput(PathBuf),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "the number of files in the directories is different: prediction files {prediction}, reference files {reference}"
    )]
    PairCountMismatch { prediction: usize, reference: usize },
}

impl From<VolumeError> for InputError {
    fn from(value: VolumeError) -> Self {
        InputError::InvalidInput(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPair {
    pub reference: PathBuf,
    pub prediction: PathBuf,
}

/// Directory inputs are paired by sorted file name; anything else is a single pair.
pub fn resolve_pairs(prediction: &Path, reference: &Path) -> Result<Vec<SubjectPair>, InputError> {
    let prediction = expand_tilde(prediction);
    let reference = expand_tilde(reference);
    let (prediction, reference) = (prediction.as_path(), reference.as_path());
    if prediction.is_dir() && reference.is_dir() {
        let prediction_files = list_volume_files(prediction)?;
        let reference_files = list_volume_files(reference)?;
        if prediction_files.len() != reference_files.len() {
            return Err(InputError::PairCountMismatch {
                prediction: prediction_files.len(),
                reference: reference_files.len(),
            });
        }
        tracing::info!(
            n_files = prediction_files.len(),
            "found volume files in the directories"
        );
        return Ok(prediction_files
            .into_iter()
            .zip(reference_files)
            .map(|(prediction, reference)| SubjectPair {
                reference,
                prediction,
            })
            .collect());
    }

    Ok(vec![SubjectPair {
        reference: reference.to_path_buf(),
        prediction: prediction.to_path_buf(),
    }])
}

pub fn list_volume_files(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_volume_file(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

pub fn is_volume_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.starts_with('.') && (name.ends_with(".nii.gz") || name.ends_with(".nii"))
}

/// Resolves a leading `~` to the home directory. Non-UTF-8 paths pass through.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

pub fn load_volume(path: &Path) -> Result<Volume, InputError> {
    let path = expand_tilde(path);
    let path = path.as_path();
    if !path.exists() {
        return Err(InputError::MissingInput(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InputError::InvalidInput(format!(
            "{} is not a file",
            path.display()
        )));
    }
    read_nifti(path)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
