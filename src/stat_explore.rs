//! Dataset-wide numeric summary (legacy `StatExplore` table).
//!
//! Describes every numeric column of a [`DataFrame`] in column order.
//! Boolean, categorical and text columns are skipped.
//!
//! # Example
//!
//! ```
//! use u_diagnosys::dataframe::{Column, DataFrame};
//! use u_diagnosys::stat_explore::stat_explore;
//!
//! let mut df = DataFrame::new();
//! df.add_column("LOAN", Column::from_f64s(vec![1100.0, 1300.0, 1500.0])).unwrap();
//! df.add_column("JOB", Column::text(vec!["Other", "Office", "Sales"])).unwrap();
//!
//! let report = stat_explore(&df).unwrap();
//! assert_eq!(report.result.len(), 1);
//! assert_eq!(report.result[0].stats.median, 1300.0);
//! assert!(report.text.contains("Total variables analyzed: 1"));
//! ```

use std::fmt;

use crate::dataframe::DataFrame;
use crate::error::DiagnosysError;
use crate::format::{self, Report};
use crate::moments::{self, Moments};

/// Role assigned to every summarized column.
pub const INPUT_ROLE: &str = "INPUT";

const WIDTH: usize = 120;

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSummary {
    pub variable: String,
    pub role: &'static str,
    pub stats: Moments,
}

/// Summarizes every numeric column of `df`.
///
/// # Errors
///
/// [`DiagnosysError::NoNumericColumns`] when `df` has no numeric column.
pub fn stat_explore(df: &DataFrame) -> Result<Report<Vec<VariableSummary>>, DiagnosysError> {
    let result: Vec<VariableSummary> = df
        .numeric_columns()
        .filter_map(|(name, column)| {
            let values = column.present_numeric_values()?;
            Some(VariableSummary {
                variable: name.to_string(),
                role: INPUT_ROLE,
                stats: moments::describe(&values, column.len() - values.len()),
            })
        })
        .collect();

    if result.is_empty() {
        return Err(DiagnosysError::NoNumericColumns);
    }
    tracing::debug!(variables = result.len(), rows = df.row_count(), "dataset summary computed");

    let text = SummaryTable(&result).to_string();
    Ok(Report { result, text })
}

/// Fixed-width rendering of the summary rows.
struct SummaryTable<'a>(&'a [VariableSummary]);

impl fmt::Display for SummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:^WIDTH$}", "Variable Analysis Summary")?;
        writeln!(f, "{}", "=".repeat(WIDTH))?;
        writeln!(
            f,
            "{:<14}{:<7}{:>12}{:>12}{:>9}{:>9}{:>10}{:>10}{:>10}{:>13}{:>13}",
            "Variable", "Role", "Mean", "Standard", "Non", "Missing", "Minimum", "Median", "Maximum", "Skewness", "Kurtosis"
        )?;
        writeln!(
            f,
            "{:<14}{:<7}{:>12}{:>12}{:>9}{:>9}",
            "", "", "", "Deviation", "Missing", ""
        )?;
        writeln!(f, "{}", "-".repeat(WIDTH))?;
        for row in self.0 {
            let s = &row.stats;
            writeln!(
                f,
                "{:<14}{:<7}{}{}{:>9}{:>9}{}{}{}{}{}",
                row.variable,
                row.role,
                format::right(s.mean, 5, 12),
                format::right(s.std_dev, 5, 12),
                s.count,
                s.missing,
                format::right(s.min, 0, 10),
                format::right(s.median, 0, 10),
                format::right(s.max, 0, 10),
                format::right(s.skewness, 5, 13),
                format::right(s.kurtosis, 5, 13),
            )?;
        }
        writeln!(f, "{}", "-".repeat(WIDTH))?;
        writeln!(f, "Total variables analyzed: {}", self.0.len())
    }
}
