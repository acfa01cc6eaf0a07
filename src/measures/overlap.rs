use crate::model::BinaryMask;

/// Voxel counts shared by every overlap and volume metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub tp: u64,
    pub fp: u64,
    pub fn_: u64,
    pub n_pred: u64,
    pub n_ref: u64,
}

impl Confusion {
    pub fn from_masks(prediction: &BinaryMask, reference: &BinaryMask) -> Self {
        let mut out = Confusion::default();
        for (&p, &r) in prediction.voxels().iter().zip(reference.voxels()) {
            match (p, r) {
                (true, true) => out.tp += 1,
                (true, false) => out.fp += 1,
                (false, true) => out.fn_ += 1,
                (false, false) => {}
            }
        }
        out.n_pred = out.tp + out.fp;
        out.n_ref = out.tp + out.fn_;
        out
    }

    // Both masks empty counts as a perfect overlap.
    pub fn dsc(&self) -> f64 {
        let denom = self.n_pred + self.n_ref;
        if denom == 0 {
            return 1.0;
        }
        2.0 * self.tp as f64 / denom as f64
    }

    /// With `beta == 0` the score reduces to precision, so an empty
    /// prediction against a non-empty reference scores 0.
    pub fn fbeta(&self, beta: f64) -> f64 {
        if self.n_pred == 0 && self.n_ref == 0 {
            return 1.0;
        }
        let b2 = beta * beta;
        let numerator = (1.0 + b2) * self.tp as f64;
        let denom = numerator + b2 * self.fn_ as f64 + self.fp as f64;
        if denom == 0.0 {
            return 0.0;
        }
        numerator / denom
    }

    pub fn iou(&self) -> f64 {
        let denom = self.tp + self.fp + self.fn_;
        if denom == 0 {
            return 1.0;
        }
        self.tp as f64 / denom as f64
    }

    /// `|P - R| / R`; NaN or infinite when the reference is empty.
    pub fn vol_diff(&self) -> f64 {
        (self.n_pred as f64 - self.n_ref as f64).abs() / self.n_ref as f64
    }

    /// Signed volume difference in percent of the reference volume.
    pub fn rel_vol_diff(&self) -> f64 {
        (self.n_pred as f64 - self.n_ref as f64) / self.n_ref as f64 * 100.0
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/measures/overlap.rs"]
mod tests;
