//! Single-variable report in the style of `PROC UNIVARIATE`.
//!
//! Computes moments, basic location/variability measures, tests for
//! location against zero, an 11-level quantile table and the extreme
//! observations of one numeric column, then renders them as a
//! fixed-width text report with the legacy section order:
//!
//! 1. Moments
//! 2. Basic Statistical Measures (Location | Variability)
//! 3. Tests for Location: Mu0=0
//! 4. Quantiles (Definition 5)
//! 5. Extreme Observations (Lowest | Highest)
//!
//! Missing values are discarded first. Shape statistics follow the crate
//! conventions in [`crate::moments`] (bias-corrected skewness, Pearson
//! kurtosis). Extreme observations carry their row position in the
//! source column; with fewer than 10 observations the lowest and highest
//! lists may share rows.
//!
//! # Example
//!
//! ```
//! use u_diagnosys::univariate::univariate_values;
//!
//! let r = univariate_values(&[1.0, 2.0, 3.0, 4.0, 5.0], "X").unwrap();
//! assert_eq!(r.n, 5);
//! assert_eq!(r.mean, 3.0);
//! assert_eq!(r.range, 4.0);
//! assert_eq!(r.iqr, 2.0);
//! assert!((r.tests.student_t.statistic - 4.2426).abs() < 1e-4);
//! ```

use std::fmt::{self, Write as _};

use crate::dataframe::{Column, DataFrame};
use crate::error::DiagnosysError;
use crate::format::{self, Report};
use crate::location::{self, LocationTests};
use crate::moments;

/// Number of observations listed at each end of the extremes table.
pub const EXTREME_COUNT: usize = 5;

/// The fixed quantile levels and their report labels.
pub const QUANTILE_LEVELS: [(f64, &str); 11] = [
    (0.00, "0% Min"),
    (0.01, "1%"),
    (0.05, "5%"),
    (0.10, "10%"),
    (0.25, "25% Q1"),
    (0.50, "50% Median"),
    (0.75, "75% Q3"),
    (0.90, "90%"),
    (0.95, "95%"),
    (0.99, "99%"),
    (1.00, "100% Max"),
];

/// One row of the quantile table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantile {
    /// Level in `[0, 1]`.
    pub level: f64,
    pub label: &'static str,
    pub value: f64,
}

/// A value listed in the extremes table with its source row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremeObservation {
    pub value: f64,
    /// 0-based row position in the analysed column.
    pub row: usize,
}

/// Full single-variable analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct UnivariateResult {
    pub variable: String,
    /// Non-missing observations.
    pub n: usize,
    /// Missing observations discarded before analysis.
    pub missing: usize,
    /// Sum of weights (all weights are 1).
    pub sum_weights: f64,
    pub sum_observations: f64,
    pub mean: f64,
    pub median: f64,
    /// Smallest of the most frequent values.
    pub mode: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub range: f64,
    pub iqr: f64,
    pub skewness: f64,
    /// Pearson (non-excess) kurtosis.
    pub kurtosis: f64,
    /// Σx².
    pub uncorrected_ss: f64,
    /// Σ(x − x̄)².
    pub corrected_ss: f64,
    /// 100·s/x̄; `NaN` when the mean is zero.
    pub coeff_variation: f64,
    pub std_error_mean: f64,
    pub tests: LocationTests,
    pub quantiles: Vec<Quantile>,
    /// Smallest values, ascending.
    pub lowest: Vec<ExtremeObservation>,
    /// Largest values, descending.
    pub highest: Vec<ExtremeObservation>,
}

impl UnivariateResult {
    /// Looks up a quantile by level (e.g. `0.25`).
    pub fn quantile(&self, level: f64) -> Option<f64> {
        self.quantiles
            .iter()
            .find(|q| (q.level - level).abs() < 1e-12)
            .map(|q| q.value)
    }

    /// Renders the fixed-width report.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

// ── Entry points ──────────────────────────────────────────────────────

/// Analyses a numeric column.
///
/// # Errors
///
/// - [`DiagnosysError::NonNumericColumn`] if `column` is not numeric.
/// - [`DiagnosysError::EmptyInput`] if every value is missing.
pub fn univariate(column: &Column, name: &str) -> Result<UnivariateResult, DiagnosysError> {
    let observations = column
        .numeric_observations()
        .ok_or_else(|| DiagnosysError::NonNumericColumn {
            column: name.to_string(),
        })?;
    analyse(&observations, column.len() - observations.len(), name)
}

/// Analyses raw values, treating `NaN` as missing.
pub fn univariate_values(values: &[f64], name: &str) -> Result<UnivariateResult, DiagnosysError> {
    let observations: Vec<(usize, f64)> = values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .collect();
    analyse(&observations, values.len() - observations.len(), name)
}

/// Analyses the column `column_name` of `df`.
pub fn univariate_column(df: &DataFrame, column_name: &str) -> Result<UnivariateResult, DiagnosysError> {
    univariate(df.require_column(column_name)?, column_name)
}

/// Analyses a numeric column and renders the report text.
pub fn univariate_report(
    column: &Column,
    name: &str,
) -> Result<Report<UnivariateResult>, DiagnosysError> {
    let result = univariate(column, name)?;
    let text = result.render();
    Ok(Report { result, text })
}

// ── Computation ───────────────────────────────────────────────────────

fn analyse(
    observations: &[(usize, f64)],
    missing: usize,
    name: &str,
) -> Result<UnivariateResult, DiagnosysError> {
    if observations.is_empty() {
        return Err(DiagnosysError::EmptyInput {
            variable: name.to_string(),
        });
    }
    let values: Vec<f64> = observations.iter().map(|&(_, v)| v).collect();
    let n = values.len();
    let mut stats = moments::describe(&values, missing);
    // a constant column has no spread, even with a single observation
    if stats.max == stats.min {
        stats.variance = 0.0;
        stats.std_dev = 0.0;
    }

    let corrected_ss: f64 = values.iter().map(|x| (x - stats.mean).powi(2)).sum();
    let quantiles: Vec<Quantile> = QUANTILE_LEVELS
        .iter()
        .map(|&(level, label)| Quantile {
            level,
            label,
            value: moments::quantile(&values, level),
        })
        .collect();
    let q1 = moments::quantile(&values, 0.25);
    let q3 = moments::quantile(&values, 0.75);
    let (lowest, highest) = extremes(observations);

    tracing::debug!(variable = name, n, missing, "univariate analysis computed");

    Ok(UnivariateResult {
        variable: name.to_string(),
        n,
        missing,
        sum_weights: n as f64,
        sum_observations: values.iter().sum(),
        mean: stats.mean,
        median: stats.median,
        mode: mode(&values),
        std_dev: stats.std_dev,
        variance: stats.variance,
        range: stats.max - stats.min,
        iqr: q3 - q1,
        skewness: stats.skewness,
        kurtosis: stats.kurtosis,
        uncorrected_ss: values.iter().map(|x| x * x).sum(),
        corrected_ss,
        coeff_variation: if stats.mean == 0.0 {
            f64::NAN
        } else {
            stats.std_dev / stats.mean * 100.0
        },
        std_error_mean: stats.std_dev / (n as f64).sqrt(),
        tests: location::location_tests(&values),
        quantiles,
        lowest,
        highest,
    })
}

/// Smallest of the most frequent values.
fn mode(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut best = (f64::NAN, 0usize);
    for run in sorted.chunk_by(|a, b| a == b) {
        if run.len() > best.1 {
            best = (run[0], run.len());
        }
    }
    best.0
}

/// Lowest (ascending) and highest (descending) observations under one
/// total order on `(value, row)`, so the lists are disjoint once there
/// are at least `2 * EXTREME_COUNT` observations.
fn extremes(observations: &[(usize, f64)]) -> (Vec<ExtremeObservation>, Vec<ExtremeObservation>) {
    let mut ordered: Vec<ExtremeObservation> = observations
        .iter()
        .map(|&(row, value)| ExtremeObservation { value, row })
        .collect();
    ordered.sort_by(|a, b| a.value.total_cmp(&b.value).then(a.row.cmp(&b.row)));

    let k = EXTREME_COUNT.min(ordered.len());
    let lowest = ordered[..k].to_vec();
    let highest = ordered.iter().rev().take(k).copied().collect();
    (lowest, highest)
}

// ── Rendering ─────────────────────────────────────────────────────────

fn pair(out: &mut String, l1: &str, v1: String, l2: &str, v2: String) -> fmt::Result {
    writeln!(out, "{l1:<18}{v1:>16}    {l2:<18}{v2:>16}")
}

impl fmt::Display for UnivariateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let num = format::number;

        writeln!(out, "The UNIVARIATE Procedure")?;
        writeln!(out, "Variable: {}", self.variable)?;

        writeln!(out)?;
        writeln!(out, "{:>40}Moments", "")?;
        pair(&mut out, "N", self.n.to_string(), "Sum Weights", num(self.sum_weights, 0))?;
        pair(&mut out, "Mean", num(self.mean, 6), "Sum Observations", num(self.sum_observations, 4))?;
        pair(&mut out, "Std Deviation", num(self.std_dev, 6), "Variance", num(self.variance, 6))?;
        pair(&mut out, "Skewness", num(self.skewness, 8), "Kurtosis", num(self.kurtosis, 8))?;
        pair(&mut out, "Uncorrected SS", num(self.uncorrected_ss, 4), "Corrected SS", num(self.corrected_ss, 4))?;
        pair(&mut out, "Coeff Variation", num(self.coeff_variation, 6), "Std Error Mean", num(self.std_error_mean, 6))?;

        writeln!(out)?;
        writeln!(out, "{:>25}Basic Statistical Measures", "")?;
        writeln!(out, "{:>10}Location{:>24}Variability", "", "")?;
        let location = [("Mean", self.mean), ("Median", self.median), ("Mode", self.mode)];
        let variability = [
            ("Std Deviation", self.std_dev),
            ("Variance", self.variance),
            ("Range", self.range),
            ("Interquartile Range", self.iqr),
        ];
        for (i, (vl, vv)) in variability.iter().enumerate() {
            let loc = match location.get(i) {
                Some((ll, lv)) => format!("{ll:<8}{:>14}", num(*lv, 4)),
                None => String::new(),
            };
            writeln!(out, "{loc:<22}    {vl:<20}{:>14}", num(*vv, 4))?;
        }

        writeln!(out)?;
        writeln!(out, "{:>15}Tests for Location: Mu0=0", "")?;
        writeln!(out, "{:<14}{:<18}{:<20}", "Test", "-Statistic-", "-----p Value------")?;
        let t = &self.tests;
        writeln!(
            out,
            "{:<14}t {:>14}  {:<11}{:>8}",
            "Student's t",
            num(t.student_t.statistic, 6),
            "Pr > |t|",
            num(t.student_t.p_value, 4)
        )?;
        writeln!(
            out,
            "{:<14}M {:>14}  {:<11}{:>8}",
            "Sign",
            num(t.sign.statistic, 0),
            "Pr >= |M|",
            num(t.sign.p_value, 4)
        )?;
        if t.signed_rank.is_defined() {
            writeln!(
                out,
                "{:<14}S {:>14}  {:<11}{:>8}",
                "Signed Rank",
                num(t.signed_rank.statistic, 1),
                "Pr >= |S|",
                num(t.signed_rank.p_value, 4)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "{:>15}Quantiles (Definition 5)", "")?;
        writeln!(out, "{:<15}{:>14}", "Level", "Quantile")?;
        for q in &self.quantiles {
            writeln!(out, "{:<15}{:>14}", q.label, num(q.value, 4))?;
        }

        writeln!(out)?;
        writeln!(out, "{:>15}Extreme Observations", "")?;
        writeln!(out, "{:-^26}    {:-^26}", "Lowest", "Highest")?;
        writeln!(out, "{:>16}{:>10}    {:>16}{:>10}", "Value", "Obs", "Value", "Obs")?;
        for (lo, hi) in self.lowest.iter().zip(&self.highest) {
            writeln!(
                out,
                "{:>16}{:>10}    {:>16}{:>10}",
                num(lo.value, 4),
                lo.row,
                num(hi.value, 4),
                hi.row
            )?;
        }

        f.write_str(&out)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
