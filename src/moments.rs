//! Shared descriptive reducers with pinned conventions.
//!
//! Every report in this crate describes a column with the same reducer
//! set, so the conventions are fixed here once:
//!
//! - **Standard deviation / variance**: sample (divisor `n − 1`).
//! - **Skewness**: bias-corrected sample skewness (G1).
//! - **Kurtosis**: bias-corrected sample kurtosis reported in *Pearson*
//!   (non-excess) form, `G2 + 3`. A normal sample reports ≈ 3.
//! - **Quantiles and median**: R-7 linear interpolation between order
//!   statistics, `h = p·(n − 1)`.
//!
//! Shape statistics are `NaN` when the data has zero variance or too few
//! observations (skewness needs 3, kurtosis needs 4). Every reducer
//! returns `NaN` on empty input instead of failing.

use u_numflow::stats;

/// Minimum observations for a defined skewness.
pub const MIN_SKEWNESS_N: usize = 3;
/// Minimum observations for a defined kurtosis.
pub const MIN_KURTOSIS_N: usize = 4;

/// Descriptive statistics for one column or group of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Number of non-missing values.
    pub count: usize,
    /// Number of missing values.
    pub missing: usize,
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// Sample variance.
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// Bias-corrected skewness (G1).
    pub skewness: f64,
    /// Bias-corrected Pearson kurtosis (G2 + 3).
    pub kurtosis: f64,
}

impl Moments {
    /// Total rows described, missing included.
    pub fn total(&self) -> usize {
        self.count + self.missing
    }
}

/// Describes `values` (missing already removed); `missing` is carried
/// through unchanged so counts stay consistent with the source rows.
pub fn describe(values: &[f64], missing: usize) -> Moments {
    let variance = variance(values);
    Moments {
        count: values.len(),
        missing,
        mean: mean(values),
        std_dev: variance.sqrt(),
        variance,
        min: stats::min(values).unwrap_or(f64::NAN),
        max: stats::max(values).unwrap_or(f64::NAN),
        median: median(values),
        skewness: shape_or_nan(values, variance, MIN_SKEWNESS_N, stats::skewness),
        kurtosis: shape_or_nan(values, variance, MIN_KURTOSIS_N, stats::kurtosis) + 3.0,
    }
}

/// Arithmetic mean, `NaN` when empty.
pub fn mean(values: &[f64]) -> f64 {
    stats::mean(values).unwrap_or(f64::NAN)
}

/// Sample variance, `NaN` when fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    stats::variance(values).unwrap_or(f64::NAN)
}

/// Median, `NaN` when empty.
pub fn median(values: &[f64]) -> f64 {
    stats::median(values).unwrap_or(f64::NAN)
}

/// R-7 quantile at `level` in `[0, 1]`, `NaN` when empty.
pub fn quantile(values: &[f64], level: f64) -> f64 {
    stats::quantile(values, level).unwrap_or(f64::NAN)
}

fn shape_or_nan(
    values: &[f64],
    variance: f64,
    min_n: usize,
    reducer: fn(&[f64]) -> Option<f64>,
) -> f64 {
    // zero spread leaves standardized moments undefined
    if values.len() < min_n || !variance.is_finite() || variance <= 0.0 {
        return f64::NAN;
    }
    reducer(values).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn one_to_five() {
        let m = describe(&[1.0, 2.0, 3.0, 4.0, 5.0], 0);
        assert_eq!(m.count, 5);
        assert!(close(m.mean, 3.0));
        assert!(close(m.median, 3.0));
        assert!(close(m.variance, 2.5));
        assert!(close(m.std_dev, 2.5f64.sqrt()));
        assert!(close(m.skewness, 0.0));
        // excess G2 = -1.2 for a discrete uniform of five points
        assert!(close(m.kurtosis, 1.8), "kurtosis = {}", m.kurtosis);
        assert_eq!(m.min, 1.0);
        assert_eq!(m.max, 5.0);
    }

    #[test]
    fn right_skew_is_positive() {
        let data = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0];
        let m = describe(&data, 0);
        assert!(m.skewness > 1.0);
        assert!(m.kurtosis > 3.0);
    }

    #[test]
    fn empty_is_all_nan() {
        let m = describe(&[], 4);
        assert_eq!(m.count, 0);
        assert_eq!(m.total(), 4);
        assert!(m.mean.is_nan());
        assert!(m.std_dev.is_nan());
        assert!(m.min.is_nan());
        assert!(m.median.is_nan());
        assert!(m.skewness.is_nan());
        assert!(m.kurtosis.is_nan());
    }

    #[test]
    fn constant_data_has_undefined_shape() {
        let data = [7.0; 6];
        let m = describe(&data, 0);
        assert_eq!(m.variance, 0.0);
        assert!(m.skewness.is_nan());
        assert!(m.kurtosis.is_nan());
    }

    #[test]
    fn too_few_for_shape() {
        assert!(describe(&[1.0, 2.0], 0).skewness.is_nan());
        let three = describe(&[1.0, 2.0, 4.0], 0);
        assert!(three.kurtosis.is_nan());
        assert!(!three.skewness.is_nan());
    }

    #[test]
    fn single_value_std_is_nan() {
        let m = describe(&[42.0], 0);
        assert_eq!(m.mean, 42.0);
        assert!(m.std_dev.is_nan());
    }

    #[test]
    fn quantile_linear_interpolation() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&data, 0.25), 1.75));
        assert!(close(quantile(&data, 0.5), 2.5));
        assert_eq!(quantile(&data, 0.0), 1.0);
        assert_eq!(quantile(&data, 1.0), 4.0);
        assert!(quantile(&[], 0.5).is_nan());
    }
}
