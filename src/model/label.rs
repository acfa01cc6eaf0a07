use std::cmp::Ordering;
use std::fmt;

/// Numeric structure identifier as stored in a segmentation volume.
/// `0` is background. Ordered by numeric value.
#[derive(Debug, Clone, Copy)]
pub struct Label(f64);

impl Label {
    pub const BACKGROUND: Label = Label(0.0);

    #[cfg(test)]
    pub fn new(value: f64) -> Self {
        Label(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_background(self) -> bool {
        self.0 == 0.0
    }

    /// Voxel values that can act as a foreground label.
    pub fn from_voxel(value: f64) -> Option<Self> {
        if value == 0.0 || value.is_nan() {
            None
        } else {
            Some(Label(value))
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() && self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/label.rs"]
mod tests;
