//! Tests for location against a null mean of zero.
//!
//! - **Student's t**: delegates to `u-analytics` (`t = x̄ / (s/√n)`,
//!   two-sided, `n − 1` df).
//! - **Sign test**: `M` is the count of strictly positive values; the
//!   two-sided p-value is `2·P(X ≤ min(M, n − M))` for `X ~ Bin(n, ½)`,
//!   capped at 1.
//! - **Wilcoxon signed rank**: the statistic is `min(T⁺, T⁻)`, the
//!   smaller of the positive and negative rank sums over the `n′`
//!   non-zero values. The p-value is exact when `n′ ≤ 20` and the
//!   absolute values carry no ties; otherwise it comes from the normal
//!   approximation with tie correction (via `u-analytics`).
//!
//! Every test reports `NaN` for both fields when it is inapplicable
//! (too few observations, zero variance, all values zero) instead of
//! failing.

use u_numflow::special;

/// Largest `n′` for which the signed-rank p-value is computed exactly.
pub const EXACT_SIGNED_RANK_MAX_N: usize = 20;

/// Statistic and two-sided p-value of one location test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationTest {
    pub statistic: f64,
    pub p_value: f64,
}

impl LocationTest {
    /// An inapplicable test.
    pub const UNDEFINED: Self = Self {
        statistic: f64::NAN,
        p_value: f64::NAN,
    };

    /// `true` when the test could be carried out.
    pub fn is_defined(&self) -> bool {
        self.statistic.is_finite()
    }
}

/// The three location tests reported together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationTests {
    pub student_t: LocationTest,
    pub sign: LocationTest,
    pub signed_rank: LocationTest,
}

/// Runs all three tests on `values` (missing already removed).
pub fn location_tests(values: &[f64]) -> LocationTests {
    LocationTests {
        student_t: student_t(values),
        sign: sign_test(values),
        signed_rank: signed_rank(values),
    }
}

/// One-sample t-test of H₀: μ = 0.
pub fn student_t(values: &[f64]) -> LocationTest {
    u_analytics::testing::one_sample_t_test(values, 0.0)
        .map(|r| LocationTest {
            statistic: r.statistic,
            p_value: r.p_value,
        })
        .unwrap_or(LocationTest::UNDEFINED)
}

/// Sign test; the statistic is the count of strictly positive values.
pub fn sign_test(values: &[f64]) -> LocationTest {
    let n = values.len();
    if n == 0 {
        return LocationTest::UNDEFINED;
    }
    let positive = values.iter().filter(|&&v| v > 0.0).count();
    let k = positive.min(n - positive);
    LocationTest {
        statistic: positive as f64,
        p_value: (2.0 * binomial_half_cdf(k, n)).min(1.0),
    }
}

/// `P(X ≤ k)` for `X ~ Bin(n, ½)`, via `I_{1/2}(n − k, k + 1)`.
pub fn binomial_half_cdf(k: usize, n: usize) -> f64 {
    if k >= n {
        return 1.0;
    }
    special::regularized_incomplete_beta(0.5, (n - k) as f64, (k + 1) as f64).clamp(0.0, 1.0)
}

/// Wilcoxon signed-rank test of H₀: median = 0.
pub fn signed_rank(values: &[f64]) -> LocationTest {
    let nonzero: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
    let n = nonzero.len();
    if n < 2 {
        return LocationTest::UNDEFINED;
    }

    let (ranks, tied) = abs_ranks(&nonzero);
    let t_plus: f64 = nonzero
        .iter()
        .zip(&ranks)
        .filter(|(v, _)| **v > 0.0)
        .map(|(_, r)| r)
        .sum();
    let nf = n as f64;
    let t_minus = nf * (nf + 1.0) / 2.0 - t_plus;
    let statistic = t_plus.min(t_minus);

    if n <= EXACT_SIGNED_RANK_MAX_N && !tied {
        let p_value = exact_signed_rank_p(t_plus.round() as usize, n);
        return LocationTest { statistic, p_value };
    }

    let zeros = vec![0.0; n];
    match u_analytics::testing::wilcoxon_signed_rank_test(&nonzero, &zeros) {
        Some(r) => LocationTest {
            statistic,
            p_value: r.p_value.min(1.0),
        },
        None => LocationTest::UNDEFINED,
    }
}

/// Average ranks of `|v|` (1-based) in input order, and whether any tie occurred.
fn abs_ranks(values: &[f64]) -> (Vec<f64>, bool) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].abs().total_cmp(&values[b].abs()));

    let mut ranks = vec![0.0; values.len()];
    let mut tied = false;
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]].abs() == values[order[i]].abs() {
            j += 1;
        }
        tied |= j - i > 1;
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    (ranks, tied)
}

/// Exact two-sided p-value for `T⁺ = t` with `n` untied non-zero values.
///
/// Counts subsets of `{1..n}` by rank sum; the null distribution is
/// symmetric about `n(n+1)/4`.
fn exact_signed_rank_p(t: usize, n: usize) -> f64 {
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }
    let total = 2f64.powi(n as i32);
    let lower = t.min(max_sum - t);
    let tail: f64 = counts[..=lower].iter().sum();
    (2.0 * tail / total).min(1.0)
}
