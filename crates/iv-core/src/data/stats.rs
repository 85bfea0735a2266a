//! Descriptive statistics on simulated columns
//!
//! Degenerate inputs (fewer than two points, zero variance, an empty
//! instrument arm) yield `0.0` or `None` instead of NaN.

use super::FloatView;

/// Instrument values above this are treated as `Z = 1`
const ARM_SPLIT: f64 = 0.5;

/// Arithmetic mean, `0.0` for an empty column
pub fn mean(values: FloatView<'_>) -> f64 {
    values.mean().unwrap_or(0.0)
}

/// Sample covariance with one degree of freedom removed
pub fn sample_covariance(a: FloatView<'_>, b: FloatView<'_>) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }

    let mean_a = mean(a);
    let mean_b = mean(b);
    let cross: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&ai, &bi)| (ai - mean_a) * (bi - mean_b))
        .sum();

    cross / (n as f64 - 1.0)
}

/// Pearson correlation, `0.0` when either column is constant
pub fn pearson_correlation(a: FloatView<'_>, b: FloatView<'_>) -> f64 {
    if a.len().min(b.len()) < 2 {
        return 0.0;
    }

    let sd_a = a.std(1.0);
    let sd_b = b.std(1.0);
    if sd_a < 1e-12 || sd_b < 1e-12 {
        return 0.0;
    }

    sample_covariance(a, b) / (sd_a * sd_b)
}

/// Sum of squared deviations from the mean
pub fn total_sum_of_squares(values: FloatView<'_>) -> f64 {
    let m = mean(values);
    values.iter().map(|&v| (v - m).powi(2)).sum()
}

/// Mean of `values` over units whose binary instrument equals `arm`
///
/// Returns `None` if no unit falls in the arm.
pub fn arm_mean(values: FloatView<'_>, instrument: FloatView<'_>, arm: bool) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .zip(instrument.iter())
        .filter(|&(_, &z)| (z > ARM_SPLIT) == arm)
        .fold((0.0, 0usize), |(sum, count), (&v, _)| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
