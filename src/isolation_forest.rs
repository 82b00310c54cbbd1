//! Isolation Forest anomaly estimator.
//!
//! Detects anomalies by measuring how easily points can be isolated
//! via random recursive partitioning. Anomalies require fewer splits
//! to isolate, yielding shorter path lengths.
//!
//! # Algorithm
//!
//! Reference: Liu, Ting & Zhou (2008). "Isolation Forest", ICDM.
//!
//! 1. Build an ensemble of isolation trees, each on a random subsample
//!    of `min(256, n)` rows, depth-limited to `ceil(log2(subsample))`
//! 2. For each point, compute average path length across all trees
//! 3. Normalize using c(n) = 2H(n-1) - 2(n-1)/n (expected BST search depth)
//! 4. Anomaly score: s(x,n) = 2^(-E(h(x))/c(n))
//!
//! The estimator follows the fit / decision-function / predict contract
//! of [`AnomalyEstimator`]: `score_samples = -s`, the fitted `offset` is
//! the `contamination` quantile of the training `score_samples`, and
//! `decision_function = score_samples - offset`. Negative decisions are
//! outliers.
//!
//! # Example
//!
//! ```
//! use u_diagnosys::isolation_forest::{AnomalyEstimator, IsolationForest, IsolationForestConfig, Label};
//!
//! let mut data: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64 * 0.1, i as f64 * 0.1]).collect();
//! data.push(vec![100.0, 100.0]);
//!
//! let mut forest = IsolationForest::new(IsolationForestConfig::default().contamination(0.02));
//! forest.fit(&data).unwrap();
//! let labels = forest.predict(&data).unwrap();
//! assert_eq!(labels[50], Label::Outlier);
//! ```

use crate::error::DiagnosysError;
use crate::moments;

// ── Estimator contract ────────────────────────────────────────────────

/// Predicted class of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Normal,
    Outlier,
}

/// An unsupervised anomaly model fitted on a row-major feature matrix.
///
/// Larger `decision_function` values mean *more normal*; a negative
/// value means the row is predicted as [`Label::Outlier`].
pub trait AnomalyEstimator {
    /// Fits the model on `data` (rows of equal length).
    fn fit(&mut self, data: &[Vec<f64>]) -> Result<(), DiagnosysError>;

    /// Signed normality score per row; negative for outliers.
    fn decision_function(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, DiagnosysError>;

    /// Predicted label per row.
    fn predict(&self, data: &[Vec<f64>]) -> Result<Vec<Label>, DiagnosysError> {
        Ok(self
            .decision_function(data)?
            .into_iter()
            .map(|d| if d < 0.0 { Label::Outlier } else { Label::Normal })
            .collect())
    }
}

/// Upper bound on rows drawn for each tree.
pub const MAX_SUBSAMPLE: usize = 256;

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for Isolation Forest.
#[derive(Debug, Clone)]
pub struct IsolationForestConfig {
    /// Number of isolation trees. Default: 100.
    pub n_estimators: usize,
    /// Expected proportion of anomalies, in (0.0, 0.5]. Default: 0.1.
    pub contamination: f64,
    /// Random seed. Default: Some(42).
    pub seed: Option<u64>,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            contamination: 0.1,
            seed: Some(42),
        }
    }
}

impl IsolationForestConfig {
    /// Sets the number of trees.
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Sets the contamination rate.
    pub fn contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<(), DiagnosysError> {
        if self.n_estimators == 0 {
            return Err(DiagnosysError::InvalidParameter {
                name: "n_estimators".into(),
                message: "must be at least 1".into(),
            });
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(DiagnosysError::InvalidParameter {
                name: "contamination".into(),
                message: format!("must be in (0.0, 0.5], got {}", self.contamination),
            });
        }
        Ok(())
    }
}

// ── Model ─────────────────────────────────────────────────────────────

struct FittedForest {
    trees: Vec<ITreeNode>,
    n_features: usize,
    subsample: usize,
    offset: f64,
}

/// Isolation Forest estimator; call [`AnomalyEstimator::fit`] before scoring.
pub struct IsolationForest {
    config: IsolationForestConfig,
    fitted: Option<FittedForest>,
}

impl IsolationForest {
    /// Creates an unfitted forest.
    pub fn new(config: IsolationForestConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Threshold subtracted from `score_samples`, once fitted.
    pub fn offset(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.offset)
    }

    /// Raw anomaly scores `s(x)` in (0, 1]; higher is more anomalous.
    pub fn anomaly_scores(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, DiagnosysError> {
        let fitted = self.fitted.as_ref().ok_or(DiagnosysError::NotFitted)?;
        validate_matrix(data, 1)?;
        if data[0].len() != fitted.n_features {
            return Err(DiagnosysError::DimensionMismatch {
                expected: fitted.n_features,
                actual: data[0].len(),
            });
        }
        Ok(score_points(data, &fitted.trees, fitted.subsample))
    }

    /// Opposite of the anomaly score; lower is more anomalous.
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, DiagnosysError> {
        Ok(self.anomaly_scores(data)?.into_iter().map(|s| -s).collect())
    }
}

impl AnomalyEstimator for IsolationForest {
    fn fit(&mut self, data: &[Vec<f64>]) -> Result<(), DiagnosysError> {
        self.config.validate()?;
        let d = validate_matrix(data, 2)?;
        let n = data.len();

        let subsample = n.min(MAX_SUBSAMPLE);
        let max_depth = (subsample as f64).log2().ceil() as usize;

        let mut rng_state = self.config.seed.unwrap_or(12345);
        let trees: Vec<ITreeNode> = (0..self.config.n_estimators)
            .map(|_| {
                let indices = sample_indices(n, subsample, &mut rng_state);
                let rows: Vec<&[f64]> = indices.iter().map(|&i| data[i].as_slice()).collect();
                build_itree(&rows, d, max_depth, &mut rng_state)
            })
            .collect();

        let training: Vec<f64> = score_points(data, &trees, subsample)
            .into_iter()
            .map(|s| -s)
            .collect();
        let offset = moments::quantile(&training, self.config.contamination);

        tracing::debug!(
            rows = n,
            features = d,
            trees = trees.len(),
            subsample,
            offset,
            "isolation forest fitted"
        );

        self.fitted = Some(FittedForest {
            trees,
            n_features: d,
            subsample,
            offset,
        });
        Ok(())
    }

    fn decision_function(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, DiagnosysError> {
        let offset = self.offset().ok_or(DiagnosysError::NotFitted)?;
        Ok(self
            .score_samples(data)?
            .into_iter()
            .map(|s| s - offset)
            .collect())
    }
}

/// Checks shape and finiteness; returns the feature count.
fn validate_matrix(data: &[Vec<f64>], min_rows: usize) -> Result<usize, DiagnosysError> {
    if data.len() < min_rows {
        return Err(DiagnosysError::InsufficientData {
            min_required: min_rows,
            actual: data.len(),
        });
    }
    let d = data[0].len();
    if d == 0 {
        return Err(DiagnosysError::EmptyFeatureList);
    }
    for (i, point) in data.iter().enumerate() {
        if point.len() != d {
            return Err(DiagnosysError::DimensionMismatch {
                expected: d,
                actual: point.len(),
            });
        }
        if point.iter().any(|v| !v.is_finite()) {
            return Err(DiagnosysError::MissingValues {
                column: format!("row[{i}]"),
                count: point.iter().filter(|v| !v.is_finite()).count(),
            });
        }
    }
    Ok(d)
}

fn score_points(data: &[Vec<f64>], trees: &[ITreeNode], subsample: usize) -> Vec<f64> {
    let cn = c_factor(subsample);
    data.iter()
        .map(|point| {
            let avg_path = trees
                .iter()
                .map(|tree| path_length(point, tree, 0))
                .sum::<f64>()
                / trees.len() as f64;
            if cn > 0.0 {
                2.0f64.powf(-avg_path / cn)
            } else {
                0.5 // degenerate case
            }
        })
        .collect()
}

// ── Isolation Tree internals ──────────────────────────────────────────

/// Node in an isolation tree.
enum ITreeNode {
    /// Internal split node.
    Internal {
        feature: usize,
        split_value: f64,
        left: Box<ITreeNode>,
        right: Box<ITreeNode>,
    },
    /// External (leaf) node.
    External { size: usize },
}

/// Builds a single isolation tree from a subsample.
fn build_itree(data: &[&[f64]], d: usize, max_depth: usize, rng: &mut u64) -> ITreeNode {
    let n = data.len();
    if n <= 1 || max_depth == 0 {
        return ITreeNode::External { size: n };
    }

    let feature = lcg_next_usize(rng, d);
    let (min_val, max_val) = data
        .iter()
        .map(|p| p[feature])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    // All values identical for this feature
    if (max_val - min_val).abs() < 1e-15 {
        return ITreeNode::External { size: n };
    }

    let split_value = min_val + lcg_next_f64(rng) * (max_val - min_val);
    let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
        data.iter().copied().partition(|p| p[feature] < split_value);

    if left.is_empty() || right.is_empty() {
        return ITreeNode::External { size: n };
    }

    ITreeNode::Internal {
        feature,
        split_value,
        left: Box::new(build_itree(&left, d, max_depth - 1, rng)),
        right: Box::new(build_itree(&right, d, max_depth - 1, rng)),
    }
}

/// Computes the path length for a point traversing the tree.
fn path_length(point: &[f64], node: &ITreeNode, current_depth: usize) -> f64 {
    match node {
        ITreeNode::External { size } => current_depth as f64 + c_factor(*size),
        ITreeNode::Internal {
            feature,
            split_value,
            left,
            right,
        } => {
            let next = if point[*feature] < *split_value { left } else { right };
            path_length(point, next, current_depth + 1)
        }
    }
}

/// Average path length of unsuccessful search in BST of size n.
///
/// c(n) = 2*H(n-1) - 2*(n-1)/n
/// where H(i) ≈ ln(i) + γ (Euler-Mascheroni constant).
fn c_factor(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    if n == 2 {
        return 1.0;
    }
    let n_f = n as f64;
    let harmonic = (n_f - 1.0).ln() + 0.5772156649;
    2.0 * harmonic - 2.0 * (n_f - 1.0) / n_f
}

// ── RNG helpers ───────────────────────────────────────────────────────

/// LCG random: returns [0, 1).
fn lcg_next_f64(state: &mut u64) -> f64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (*state >> 33) as f64 / (1u64 << 31) as f64
}

/// LCG random: returns [0, max).
fn lcg_next_usize(state: &mut u64, max: usize) -> usize {
    (lcg_next_f64(state) * max as f64) as usize % max
}

/// Sample `k` unique indices from `0..n` using Fisher-Yates partial shuffle.
fn sample_indices(n: usize, k: usize, rng: &mut u64) -> Vec<usize> {
    let k = k.min(n);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = i + lcg_next_usize(rng, n - i);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_normal_with_outliers() -> Vec<Vec<f64>> {
        let mut data = Vec::new();
        // Normal cluster around (5, 5)
        for i in 0..40 {
            let x = 5.0 + (i % 7) as f64 * 0.2 - 0.6;
            let y = 5.0 + (i % 5) as f64 * 0.3 - 0.6;
            data.push(vec![x, y]);
        }
        data.push(vec![50.0, 50.0]);
        data.push(vec![-40.0, -40.0]);
        data.push(vec![50.0, -40.0]);
        data
    }

    fn fitted(contamination: f64) -> (IsolationForest, Vec<Vec<f64>>) {
        let data = make_normal_with_outliers();
        let mut forest =
            IsolationForest::new(IsolationForestConfig::default().contamination(contamination));
        forest.fit(&data).unwrap();
        (forest, data)
    }

    // ── Detection ────────────────────────────────────────────────

    #[test]
    fn outlier_scores_higher_than_normal() {
        let (forest, data) = fitted(0.1);
        let scores = forest.anomaly_scores(&data).unwrap();
        let normal_max = scores[..40].iter().copied().fold(0.0f64, f64::max);
        let outlier_min = scores[40..].iter().copied().fold(1.0f64, f64::min);
        assert!(
            outlier_min > normal_max,
            "outlier min score ({outlier_min}) should exceed normal max ({normal_max})"
        );
    }

    #[test]
    fn predict_agrees_with_decision_sign() {
        let (forest, data) = fitted(0.1);
        let decisions = forest.decision_function(&data).unwrap();
        let labels = forest.predict(&data).unwrap();
        for (d, l) in decisions.iter().zip(&labels) {
            assert_eq!(*l == Label::Outlier, *d < 0.0);
        }
        for label in &labels[40..] {
            assert_eq!(*label, Label::Outlier);
        }
    }

    #[test]
    fn outlier_count_bounded_by_contamination() {
        let (forest, data) = fitted(0.1);
        let outliers = forest
            .predict(&data)
            .unwrap()
            .into_iter()
            .filter(|l| *l == Label::Outlier)
            .count();
        // strictly below the contamination quantile
        assert!(outliers <= (data.len() as f64 * 0.1).ceil() as usize);
        assert!(outliers >= 3);
    }

    #[test]
    fn offset_is_contamination_quantile() {
        let (forest, data) = fitted(0.1);
        let samples = forest.score_samples(&data).unwrap();
        let expected = moments::quantile(&samples, 0.1);
        assert_eq!(forest.offset(), Some(expected));
    }

    #[test]
    fn scores_in_range() {
        let (forest, data) = fitted(0.1);
        for (i, s) in forest.anomaly_scores(&data).unwrap().into_iter().enumerate() {
            assert!((0.0..=1.0).contains(&s), "score[{i}] = {s} out of [0, 1] range");
        }
    }

    #[test]
    fn scores_reproducible_with_seed() {
        let data = make_normal_with_outliers();
        let config = IsolationForestConfig::default().seed(Some(123));
        let mut a = IsolationForest::new(config.clone());
        let mut b = IsolationForest::new(config);
        a.fit(&data).unwrap();
        b.fit(&data).unwrap();
        assert_eq!(
            a.decision_function(&data).unwrap(),
            b.decision_function(&data).unwrap()
        );
    }

    #[test]
    fn one_dimensional_outlier() {
        let mut data: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64 * 0.1]).collect();
        data.push(vec![100.0]);
        let mut forest = IsolationForest::new(IsolationForestConfig::default());
        forest.fit(&data).unwrap();
        let scores = forest.anomaly_scores(&data).unwrap();
        let normal_mean: f64 = scores[..30].iter().sum::<f64>() / 30.0;
        assert!(scores[30] > normal_mean);
    }

    // ── Error cases ──────────────────────────────────────────────

    #[test]
    fn unfitted_model_refuses_to_score() {
        let forest = IsolationForest::new(IsolationForestConfig::default());
        assert_eq!(
            forest.decision_function(&[vec![1.0]]).unwrap_err(),
            DiagnosysError::NotFitted
        );
    }

    #[test]
    fn single_point_rejected() {
        let mut forest = IsolationForest::new(IsolationForestConfig::default());
        assert!(matches!(
            forest.fit(&[vec![1.0, 2.0]]),
            Err(DiagnosysError::InsufficientData { .. })
        ));
    }

    #[test]
    fn nan_rejected() {
        let mut forest = IsolationForest::new(IsolationForestConfig::default());
        assert!(forest.fit(&[vec![1.0, f64::NAN], vec![2.0, 3.0]]).is_err());
    }

    #[test]
    fn dimension_mismatch() {
        let (forest, _) = fitted(0.1);
        assert!(matches!(
            forest.decision_function(&[vec![1.0, 2.0, 3.0]]),
            Err(DiagnosysError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn contamination_out_of_range() {
        let data = make_normal_with_outliers();
        for c in [0.0, 0.6, f64::NAN] {
            let mut forest = IsolationForest::new(IsolationForestConfig::default().contamination(c));
            assert!(matches!(
                forest.fit(&data),
                Err(DiagnosysError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn zero_trees_rejected() {
        let data = make_normal_with_outliers();
        let mut forest = IsolationForest::new(IsolationForestConfig::default().n_estimators(0));
        assert!(forest.fit(&data).is_err());
    }

    #[test]
    fn c_factor_known_values() {
        assert_eq!(c_factor(1), 0.0);
        assert_eq!(c_factor(2), 1.0);
        let c256 = c_factor(256);
        assert!((c256 - 10.244).abs() < 0.1, "c(256) = {c256}, expected ~10.244");
    }
}
