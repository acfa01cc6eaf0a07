pub mod json;

/// Written for cells whose record did not carry the metric.
pub const MISSING_VALUE: &str = "";

pub fn format_f64_6(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:.6}", v)
    }
}

pub fn format_cell(v: Option<f64>) -> String {
    match v {
        Some(v) => format_f64_6(v),
        None => MISSING_VALUE.to_string(),
    }
}

pub fn format_flag(v: bool) -> &'static str {
    if v { "True" } else { "False" }
}

fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Nearest-rank quantile over finite values; `None` when there are none.
pub fn quantile_indexed(values: &[f64], p: f64) -> Option<f64> {
    let sorted = finite_sorted(values);
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let idx = ((n - 1) as f64 * p).ceil() as usize;
    Some(sorted[idx])
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile_indexed(values, 0.5)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    let finite = finite_sorted(values);
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
