//! Class-conditional distribution of a numeric column.
//!
//! Splits an analysis column by the levels of a (typically binary) target
//! column and describes each level, then appends an `_OVERALL_` row for
//! the whole column. This reproduces the legacy "distribution by target
//! level" table used when screening candidate predictors.
//!
//! Rows whose target value is missing belong to no level. They are still
//! described by the `_OVERALL_` row, which always covers every row of the
//! analysis column.
//!
//! # Example
//!
//! ```
//! use u_diagnosys::class_conditional::class_conditional_distribution;
//! use u_diagnosys::dataframe::{Column, DataFrame};
//!
//! let mut df = DataFrame::new();
//! df.add_column("LOAN", Column::from_f64s(vec![1000.0, 2000.0, 3000.0, f64::NAN])).unwrap();
//! df.add_column("BAD", Column::from_f64s(vec![0.0, 0.0, 1.0, 1.0])).unwrap();
//!
//! let summary = class_conditional_distribution(&df, "BAD", "LOAN").unwrap();
//! assert_eq!(summary.rows.len(), 3);
//! assert_eq!(summary.overall().stats.mean, 2000.0);
//! assert_eq!(summary.overall().stats.missing, 1);
//! ```

use std::fmt;

use crate::dataframe::{Column, DataFrame, DataType, GroupKey};
use crate::error::DiagnosysError;
use crate::format;
use crate::moments::{self, Moments};

/// Level label of the synthetic whole-column row.
pub const OVERALL_LEVEL: &str = "_OVERALL_";

/// The level a [`SummaryRow`] describes.
#[derive(Debug, Clone, PartialEq)]
pub enum Level {
    /// One distinct value of the target column.
    Group(GroupKey),
    /// Every row of the analysis column.
    Overall,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(key) => write!(f, "{key}"),
            Self::Overall => f.write_str(OVERALL_LEVEL),
        }
    }
}

/// Statistics of the analysis column for one level.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub level: Level,
    pub stats: Moments,
}

/// Per-level description of an analysis column, plus the overall row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassConditionalSummary {
    /// Target (grouping) column name.
    pub target: String,
    /// Analysis column name.
    pub analysis: String,
    /// One row per level in ascending key order, then the overall row.
    pub rows: Vec<SummaryRow>,
    /// Rows left out of every level because their target was missing.
    pub dropped_rows: usize,
}

impl ClassConditionalSummary {
    /// The synthetic `_OVERALL_` row (always last).
    pub fn overall(&self) -> &SummaryRow {
        // construction always pushes the overall row last
        &self.rows[self.rows.len() - 1]
    }

    /// Rows describing individual levels.
    pub fn groups(&self) -> &[SummaryRow] {
        &self.rows[..self.rows.len() - 1]
    }

    /// Looks up the row for a given target level.
    pub fn group(&self, key: &GroupKey) -> Option<&SummaryRow> {
        self.groups()
            .iter()
            .find(|r| matches!(&r.level, Level::Group(k) if k == key))
    }

    /// Renders the legacy fixed-width table.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

const HEADERS: [&str; 11] = [
    "Target",
    "Target Level",
    "Median",
    "Missing",
    "Non Missing",
    "Minimum",
    "Maximum",
    "Mean",
    "Standard Deviation",
    "Skewness",
    "Kurtosis",
];

impl fmt::Display for ClassConditionalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Distribution of {} by {}", self.analysis, self.target)?;
        let header: Vec<String> = HEADERS
            .iter()
            .enumerate()
            .map(|(i, h)| if i < 2 { format!("{h:<14}") } else { format!("{h:>19}") })
            .collect();
        let header = header.join(" ");
        writeln!(f, "{header}")?;
        writeln!(f, "{}", "-".repeat(header.len()))?;
        for row in &self.rows {
            let s = &row.stats;
            writeln!(
                f,
                "{:<14} {:<14} {} {:>19} {:>19} {} {} {} {} {} {}",
                self.target,
                row.level.to_string(),
                format::right(s.median, 4, 19),
                s.missing,
                s.count,
                format::right(s.min, 4, 19),
                format::right(s.max, 4, 19),
                format::right(s.mean, 4, 19),
                format::right(s.std_dev, 4, 19),
                format::right(s.skewness, 6, 19),
                format::right(s.kurtosis, 6, 19),
            )?;
        }
        Ok(())
    }
}

/// Describes `analysis_col` separately for every level of `target_col`.
///
/// Levels appear in ascending key order followed by the `_OVERALL_` row.
/// A level whose analysis values are all missing reports `NaN` statistics
/// with correct counts.
///
/// # Errors
///
/// - [`DiagnosysError::MissingColumns`] if either column does not exist.
/// - [`DiagnosysError::NonNumericColumn`] if the analysis column is not numeric.
pub fn class_conditional_distribution(
    df: &DataFrame,
    target_col: &str,
    analysis_col: &str,
) -> Result<ClassConditionalSummary, DiagnosysError> {
    let missing = df.missing_columns(&[target_col, analysis_col]);
    if !missing.is_empty() {
        return Err(DiagnosysError::MissingColumns { names: missing });
    }
    let analysis = df.require_column(analysis_col)?;
    if analysis.data_type() != DataType::Numeric {
        return Err(DiagnosysError::NonNumericColumn {
            column: analysis_col.to_string(),
        });
    }

    let (groups, dropped_rows) = df.group_rows(target_col)?;
    if dropped_rows > 0 {
        tracing::warn!(
            target_col,
            dropped_rows,
            "rows with a missing target level are excluded from level rows"
        );
    }

    let mut rows: Vec<SummaryRow> = groups
        .into_iter()
        .map(|(key, members)| SummaryRow {
            level: Level::Group(key),
            stats: describe_rows(analysis, &members),
        })
        .collect();

    let all_rows: Vec<usize> = (0..df.row_count()).collect();
    rows.push(SummaryRow {
        level: Level::Overall,
        stats: describe_rows(analysis, &all_rows),
    });

    tracing::debug!(
        target_col,
        analysis_col,
        levels = rows.len() - 1,
        "class-conditional distribution computed"
    );

    Ok(ClassConditionalSummary {
        target: target_col.to_string(),
        analysis: analysis_col.to_string(),
        rows,
        dropped_rows,
    })
}

fn describe_rows(column: &Column, rows: &[usize]) -> Moments {
    let values: Vec<f64> = rows.iter().filter_map(|&r| column.numeric_at(r)).collect();
    let missing = rows.len() - values.len();
    moments::describe(&values, missing)
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::ValidityBitmap;
    use proptest::prelude::*;

    fn loan_bad() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column(
            "LOAN",
            Column::from_f64s(vec![1000.0, 2000.0, 3000.0, f64::NAN]),
        )
        .unwrap();
        df.add_column("BAD", Column::from_f64s(vec![0.0, 0.0, 1.0, 1.0]))
            .unwrap();
        df
    }

    // ── Reference example ────────────────────────────────────────

    #[test]
    fn loan_by_bad() {
        let summary = class_conditional_distribution(&loan_bad(), "BAD", "LOAN").unwrap();
        assert_eq!(summary.rows.len(), 3);

        let g0 = summary.group(&GroupKey::Number(0.0)).unwrap();
        assert_eq!(g0.stats.mean, 1500.0);
        assert_eq!(g0.stats.missing, 0);
        assert_eq!(g0.stats.count, 2);

        let g1 = summary.group(&GroupKey::Number(1.0)).unwrap();
        assert_eq!(g1.stats.mean, 3000.0);
        assert_eq!(g1.stats.missing, 1);
        assert_eq!(g1.stats.count, 1);
        assert!(g1.stats.std_dev.is_nan());

        let all = summary.overall();
        assert_eq!(all.level, Level::Overall);
        assert_eq!(all.stats.mean, 2000.0);
        assert_eq!(all.stats.missing, 1);
        assert_eq!(all.stats.count, 3);
        assert_eq!(all.stats.median, 2000.0);
    }

    #[test]
    fn levels_in_ascending_order() {
        let mut df = DataFrame::new();
        df.add_column("y", Column::from_f64s(vec![1.0, 0.0, 1.0, 0.0]))
            .unwrap();
        df.add_column("x", Column::from_f64s(vec![5.0, 6.0, 7.0, 8.0]))
            .unwrap();
        let summary = class_conditional_distribution(&df, "y", "x").unwrap();
        let levels: Vec<String> = summary.rows.iter().map(|r| r.level.to_string()).collect();
        assert_eq!(levels, vec!["0", "1", OVERALL_LEVEL]);
    }

    // ── Edge cases ───────────────────────────────────────────────

    #[test]
    fn all_missing_group_has_counts_only() {
        let mut df = DataFrame::new();
        df.add_column("t", Column::text(vec!["a", "a", "b"])).unwrap();
        df.add_column("x", Column::from_f64s(vec![1.0, 2.0, f64::NAN]))
            .unwrap();
        let summary = class_conditional_distribution(&df, "t", "x").unwrap();
        let b = summary.group(&GroupKey::Label("b".into())).unwrap();
        assert_eq!(b.stats.count, 0);
        assert_eq!(b.stats.missing, 1);
        assert!(b.stats.mean.is_nan());
        assert!(b.stats.median.is_nan());
    }

    #[test]
    fn missing_target_rows_only_in_overall() {
        let mut validity = ValidityBitmap::all_valid(3);
        validity.set_invalid(2);
        let mut df = DataFrame::new();
        df.add_column("t", Column::boolean(vec![true, false, false], validity))
            .unwrap();
        df.add_column("x", Column::from_f64s(vec![1.0, 2.0, 30.0]))
            .unwrap();
        let summary = class_conditional_distribution(&df, "t", "x").unwrap();
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(summary.groups().len(), 2);
        assert_eq!(summary.groups()[0].level, Level::Group(GroupKey::Flag(false)));
        assert_eq!(summary.overall().stats.count, 3);
        assert_eq!(summary.overall().stats.max, 30.0);
    }

    #[test]
    fn missing_columns_reported_together() {
        let err = class_conditional_distribution(&loan_bad(), "TARGET", "DEBTINC").unwrap_err();
        assert_eq!(
            err,
            DiagnosysError::MissingColumns {
                names: vec!["TARGET".into(), "DEBTINC".into()]
            }
        );
    }

    #[test]
    fn text_analysis_column_rejected() {
        let mut df = loan_bad();
        df.add_column("JOB", Column::text(vec!["a", "b", "c", "d"]))
            .unwrap();
        assert!(matches!(
            class_conditional_distribution(&df, "BAD", "JOB"),
            Err(DiagnosysError::NonNumericColumn { .. })
        ));
    }

    #[test]
    fn render_has_legacy_columns() {
        let text = class_conditional_distribution(&loan_bad(), "BAD", "LOAN")
            .unwrap()
            .render();
        for h in HEADERS {
            assert!(text.contains(h), "missing header {h}");
        }
        assert!(text.contains(OVERALL_LEVEL));
        assert!(text.contains("1500.0000"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3 + 3);
    }

    proptest! {
        #[test]
        fn counts_add_up_per_level(
            cells in proptest::collection::vec((0u8..2, proptest::option::of(-1e6f64..1e6)), 1..60)
        ) {
            let keys: Vec<f64> = cells.iter().map(|(k, _)| *k as f64).collect();
            let values: Vec<Option<f64>> = cells.iter().map(|(_, v)| *v).collect();
            let mut df = DataFrame::new();
            df.add_column("k", Column::from_f64s(keys.clone())).unwrap();
            df.add_column("v", Column::from_options(values)).unwrap();

            let summary = class_conditional_distribution(&df, "k", "v").unwrap();
            for row in summary.groups() {
                let Level::Group(GroupKey::Number(k)) = row.level else {
                    panic!("unexpected level {:?}", row.level);
                };
                let expected = keys.iter().filter(|&&x| x == k).count();
                prop_assert_eq!(row.stats.total(), expected);
            }
            prop_assert_eq!(summary.overall().stats.total(), cells.len());
        }
    }
}
