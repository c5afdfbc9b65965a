//! Descriptive statistics helpers shared by the analytics engine
//!
//! Sample statistics use the `n - 1` denominator. Helpers return `None`
//! instead of NaN whenever a value is undefined for the given input.

use statrs::statistics::Statistics;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.mean())
}

/// Sample standard deviation, `None` with fewer than two values
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let std_dev = values.std_dev();
    std_dev.is_finite().then_some(std_dev)
}

/// Pearson correlation coefficient of two equally long columns.
///
/// `None` with fewer than two observations or when either column is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let sx = xs.std_dev();
    let sy = ys.std_dev();
    if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
        return None;
    }

    let r = xs.covariance(ys) / (sx * sy);
    // Rounding can push perfectly correlated columns a hair past +-1
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Apply `stat` to every trailing window of `window` values.
///
/// Position `i` holds `stat(values[i + 1 - window..=i])`; the first
/// `window - 1` positions are `None`.
pub fn rolling<F>(values: &[f64], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                stat(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Minimum of a slice, `None` when empty
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Maximum of a slice, `None` when empty
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
