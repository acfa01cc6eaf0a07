use crate::model::BinaryMask;
use crate::model::volume::strides;

/// Directed border-to-border distances between two masks.
#[derive(Debug, Clone, Default)]
pub struct SurfaceDistances {
    /// Distance from each prediction border voxel to the reference border.
    pub pred_to_ref: Vec<f64>,
    /// Distance from each reference border voxel to the prediction border.
    pub ref_to_pred: Vec<f64>,
}

impl SurfaceDistances {
    pub fn compute(prediction: &BinaryMask, reference: &BinaryMask, spacing: &[f64]) -> Self {
        let shape = reference.shape();
        let border_pred = border_map(prediction.voxels(), shape);
        let border_ref = border_map(reference.voxels(), shape);

        let dist_to_ref = distance_to_features(&border_ref, shape, spacing);
        let dist_to_pred = distance_to_features(&border_pred, shape, spacing);

        let pred_to_ref = collect_at(&border_pred, &dist_to_ref);
        let ref_to_pred = collect_at(&border_ref, &dist_to_pred);
        Self {
            pred_to_ref,
            ref_to_pred,
        }
    }

    fn any_side_empty(&self) -> bool {
        self.pred_to_ref.is_empty() || self.ref_to_pred.is_empty()
    }

    /// Share of both borders lying within `tau` of the other border.
    pub fn nsd(&self, tau: f64) -> f64 {
        let total = self.pred_to_ref.len() + self.ref_to_pred.len();
        if total == 0 {
            return f64::NAN;
        }
        if self.any_side_empty() {
            return 0.0;
        }
        let within = self
            .pred_to_ref
            .iter()
            .chain(&self.ref_to_pred)
            .filter(|&&d| d <= tau)
            .count();
        within as f64 / total as f64
    }

    pub fn hd(&self) -> f64 {
        if self.any_side_empty() {
            return f64::NAN;
        }
        max_of(&self.pred_to_ref).max(max_of(&self.ref_to_pred))
    }

    pub fn hd_perc(&self, percentile: f64) -> f64 {
        if self.any_side_empty() {
            return f64::NAN;
        }
        percentile_linear(&self.pred_to_ref, percentile)
            .max(percentile_linear(&self.ref_to_pred, percentile))
    }

    pub fn masd(&self) -> f64 {
        if self.any_side_empty() {
            return f64::NAN;
        }
        0.5 * (mean_of(&self.pred_to_ref) + mean_of(&self.ref_to_pred))
    }

    pub fn assd(&self) -> f64 {
        if self.any_side_empty() {
            return f64::NAN;
        }
        let n = self.pred_to_ref.len() + self.ref_to_pred.len();
        let sum: f64 = self.pred_to_ref.iter().chain(&self.ref_to_pred).sum();
        sum / n as f64
    }
}

/// Mask voxels with a face neighbour outside the mask or outside the grid.
pub fn border_map(mask: &[bool], shape: &[usize]) -> Vec<bool> {
    let strides = strides(shape);
    let mut out = vec![false; mask.len()];
    for (idx, &inside) in mask.iter().enumerate() {
        if !inside {
            continue;
        }
        let mut border = false;
        for axis in 0..shape.len() {
            let coord = (idx / strides[axis]) % shape[axis];
            if coord == 0 || coord + 1 == shape[axis] {
                border = true;
                break;
            }
            if !mask[idx - strides[axis]] || !mask[idx + strides[axis]] {
                border = true;
                break;
            }
        }
        out[idx] = border;
    }
    out
}

/// Exact Euclidean distance from every voxel to the nearest `true` voxel of
/// `features`, using separable lower-envelope passes. All-false input yields
/// infinity everywhere.
pub fn distance_to_features(features: &[bool], shape: &[usize], spacing: &[f64]) -> Vec<f64> {
    let mut sq: Vec<f64> = features
        .iter()
        .map(|&f| if f { 0.0 } else { f64::INFINITY })
        .collect();
    let strides = strides(shape);

    let max_dim = shape.iter().copied().max().unwrap_or(0);
    let mut line = vec![0.0f64; max_dim];
    let mut out = vec![0.0f64; max_dim];
    let mut envelope = Envelope::with_capacity(max_dim);

    for axis in 0..shape.len() {
        let n = shape[axis];
        let stride = strides[axis];
        let scale = spacing.get(axis).copied().unwrap_or(1.0);
        for start in 0..sq.len() {
            if (start / stride) % n != 0 {
                continue;
            }
            for i in 0..n {
                line[i] = sq[start + i * stride];
            }
            envelope.transform(&line[..n], scale, &mut out[..n]);
            for i in 0..n {
                sq[start + i * stride] = out[i];
            }
        }
    }

    sq.into_iter().map(f64::sqrt).collect()
}

struct Envelope {
    vertices: Vec<usize>,
    bounds: Vec<f64>,
}

impl Envelope {
    fn with_capacity(n: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(n),
            bounds: Vec::with_capacity(n),
        }
    }

    // out[i] = min_q ((i - q) * scale)^2 + f[q]
    fn transform(&mut self, f: &[f64], scale: f64, out: &mut [f64]) {
        self.vertices.clear();
        self.bounds.clear();
        let pos = |q: usize| q as f64 * scale;

        for q in 0..f.len() {
            if !f[q].is_finite() {
                continue;
            }
            loop {
                let (Some(&p), Some(&left)) = (self.vertices.last(), self.bounds.last()) else {
                    self.vertices.push(q);
                    self.bounds.push(f64::NEG_INFINITY);
                    break;
                };
                let (xp, xq) = (pos(p), pos(q));
                let s = ((f[q] + xq * xq) - (f[p] + xp * xp)) / (2.0 * (xq - xp));
                if s <= left {
                    self.vertices.pop();
                    self.bounds.pop();
                } else {
                    self.vertices.push(q);
                    self.bounds.push(s);
                    break;
                }
            }
        }

        if self.vertices.is_empty() {
            out.fill(f64::INFINITY);
            return;
        }

        let mut k = 0usize;
        for (i, slot) in out.iter_mut().enumerate() {
            let x = pos(i);
            while k + 1 < self.vertices.len() && self.bounds[k + 1] < x {
                k += 1;
            }
            let v = self.vertices[k];
            let d = x - pos(v);
            *slot = d * d + f[v];
        }
    }
}

fn collect_at(mask: &[bool], values: &[f64]) -> Vec<f64> {
    mask.iter()
        .zip(values)
        .filter(|(m, _)| **m)
        .map(|(_, &v)| v)
        .collect()
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile_linear(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
#[path = "../../tests/src_inline/measures/distance.rs"]
mod tests;
