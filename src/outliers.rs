//! Multivariate outlier scoring over a feature subset.
//!
//! Fits an [`AnomalyEstimator`] (by default an [`IsolationForest`]) on the
//! selected feature columns and returns a copy of the input with two
//! appended columns:
//!
//! - `outlier_score`: the negated decision function, so larger always
//!   means more anomalous and positive scores are outliers.
//! - `outlier_flag`: `1.0` when the estimator predicts an outlier,
//!   otherwise `0.0`.
//!
//! Rows of the copy are sorted by descending score; ties keep their
//! original relative order. The input frame is never modified.
//!
//! # Example
//!
//! ```
//! use u_diagnosys::dataframe::{Column, DataFrame};
//! use u_diagnosys::outliers::{detect_outliers, OutlierConfig, FLAG_COLUMN, SCORE_COLUMN};
//!
//! let mut x: Vec<f64> = (0..60).map(|i| (i % 10) as f64).collect();
//! let mut y: Vec<f64> = (0..60).map(|i| (i % 6) as f64).collect();
//! x.push(500.0);
//! y.push(-500.0);
//!
//! let mut df = DataFrame::new();
//! df.add_column("x", Column::from_f64s(x)).unwrap();
//! df.add_column("y", Column::from_f64s(y)).unwrap();
//!
//! let scored = detect_outliers(&df, &["x", "y"], &OutlierConfig::default()).unwrap();
//! let top = scored.column_by_name("x").unwrap().numeric_at(0);
//! assert_eq!(top, Some(500.0));
//! assert_eq!(scored.column_by_name(FLAG_COLUMN).unwrap().numeric_at(0), Some(1.0));
//! assert!(scored.column_by_name(SCORE_COLUMN).is_some());
//! ```

use crate::dataframe::{Column, DataFrame, DataType};
use crate::error::DiagnosysError;
use crate::isolation_forest::{AnomalyEstimator, IsolationForest, IsolationForestConfig, Label};

/// Name of the appended anomaly-score column.
pub const SCORE_COLUMN: &str = "outlier_score";
/// Name of the appended 0/1 outlier-flag column.
pub const FLAG_COLUMN: &str = "outlier_flag";

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for [`detect_outliers`].
#[derive(Debug, Clone)]
pub struct OutlierConfig {
    /// Expected fraction of outliers, in (0.0, 0.5]. Default: 0.01.
    pub contamination: f64,
    /// Number of isolation trees. Default: 300.
    pub n_estimators: usize,
    /// Random seed. Default: 42.
    pub seed: u64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            contamination: 0.01,
            n_estimators: 300,
            seed: 42,
        }
    }
}

impl OutlierConfig {
    /// Sets the contamination fraction.
    pub fn contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    /// Sets the ensemble size.
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn forest_config(&self) -> IsolationForestConfig {
        IsolationForestConfig::default()
            .contamination(self.contamination)
            .n_estimators(self.n_estimators)
            .seed(Some(self.seed))
    }
}

// ── Result ────────────────────────────────────────────────────────────

/// Scored copy of a frame plus fit diagnostics.
#[derive(Debug, Clone)]
pub struct OutlierSummary {
    /// Input rows with score and flag columns, sorted by descending score.
    pub frame: DataFrame,
    /// Number of rows flagged as outliers.
    pub outlier_count: usize,
    /// Decision threshold fitted by the forest, when known.
    pub offset: Option<f64>,
}

// ── Entry points ──────────────────────────────────────────────────────

/// Scores rows of `df` with an Isolation Forest fitted on `features`.
///
/// # Errors
///
/// - [`DiagnosysError::EmptyFeatureList`] if `features` is empty.
/// - [`DiagnosysError::MissingColumns`] listing every unknown feature.
/// - [`DiagnosysError::NonNumericColumn`] / [`DiagnosysError::MissingValues`]
///   if a feature cannot be fed to the estimator.
/// - [`DiagnosysError::InvalidParameter`] for out-of-range configuration.
pub fn detect_outliers<S: AsRef<str>>(
    df: &DataFrame,
    features: &[S],
    config: &OutlierConfig,
) -> Result<DataFrame, DiagnosysError> {
    detect_outliers_with_summary(df, features, config).map(|scored| scored.frame)
}

/// Like [`detect_outliers`], also returning the outlier count and threshold.
pub fn detect_outliers_with_summary<S: AsRef<str>>(
    df: &DataFrame,
    features: &[S],
    config: &OutlierConfig,
) -> Result<OutlierSummary, DiagnosysError> {
    let mut forest = IsolationForest::new(config.forest_config());
    let mut scored = score_with(df, features, &mut forest)?;
    scored.offset = forest.offset();
    Ok(scored)
}

/// Scores rows of `df` with any estimator fitted on `features`.
pub fn score_with<S: AsRef<str>, E: AnomalyEstimator>(
    df: &DataFrame,
    features: &[S],
    estimator: &mut E,
) -> Result<OutlierSummary, DiagnosysError> {
    let matrix = feature_matrix(df, features)?;

    estimator.fit(&matrix)?;
    let scores: Vec<f64> = estimator
        .decision_function(&matrix)?
        .into_iter()
        .map(|d| -d)
        .collect();
    let flags: Vec<f64> = estimator
        .predict(&matrix)?
        .into_iter()
        .map(|l| if l == Label::Outlier { 1.0 } else { 0.0 })
        .collect();
    let outlier_count = flags.iter().filter(|&&f| f == 1.0).count();

    let mut order: Vec<usize> = (0..df.row_count()).collect();
    // stable: equal scores keep input order
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let frame = df
        .with_column(SCORE_COLUMN, Column::from_f64s(scores))?
        .with_column(FLAG_COLUMN, Column::from_f64s(flags))?
        .take_rows(&order);

    tracing::debug!(
        rows = df.row_count(),
        features = features.len(),
        outlier_count,
        "outlier scoring complete"
    );

    Ok(OutlierSummary {
        frame,
        outlier_count,
        offset: None,
    })
}

/// Validates `features` and gathers them into a row-major matrix.
fn feature_matrix<S: AsRef<str>>(
    df: &DataFrame,
    features: &[S],
) -> Result<Vec<Vec<f64>>, DiagnosysError> {
    if features.is_empty() {
        return Err(DiagnosysError::EmptyFeatureList);
    }
    let missing = df.missing_columns(features);
    if !missing.is_empty() {
        return Err(DiagnosysError::MissingColumns { names: missing });
    }

    let mut columns = Vec::with_capacity(features.len());
    for name in features.iter().map(AsRef::as_ref) {
        let col = df.require_column(name)?;
        if col.data_type() != DataType::Numeric {
            return Err(DiagnosysError::NonNumericColumn {
                column: name.to_string(),
            });
        }
        let count = col.missing_count();
        if count > 0 {
            return Err(DiagnosysError::MissingValues {
                column: name.to_string(),
                count,
            });
        }
        columns.push(col);
    }

    Ok((0..df.row_count())
        .map(|row| {
            columns
                .iter()
                .map(|c| c.numeric_at(row).unwrap_or(f64::NAN))
                .collect()
        })
        .collect())
}

// ── Tests ─────────────────────────────────────────────────────────────
