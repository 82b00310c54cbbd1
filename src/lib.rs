//! # u-diagnosys
//!
//! SAS-style descriptive statistics, distribution reports and
//! multivariate outlier scoring for in-memory tabular data.
//!
//! Every analysis is a pure function of a [`dataframe::DataFrame`] (or a
//! single column) that returns a structured result, and, for the
//! report-producing components, the legacy fixed-width text alongside it.
//!
//! ## Modules
//!
//! - [`dataframe`] — Column-major tabular data model (DataFrame, Column, GroupKey)
//! - [`class_conditional`] — Distribution of a numeric column by target level, plus `_OVERALL_`
//! - [`outliers`] — Isolation Forest outlier scores and flags appended to a dataset
//! - [`univariate`] — `PROC UNIVARIATE`-style single-variable report
//! - [`stat_explore`] — Dataset-wide numeric summary table
//! - [`isolation_forest`] — Isolation Forest estimator (Liu et al. 2008)
//! - [`location`] — Student's t, sign and Wilcoxon signed-rank tests against zero
//! - [`moments`] — Shared descriptive statistics and shape conventions
//! - [`format`] — Fixed-width cell formatting and the `Report` wrapper
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_diagnosys::dataframe::{Column, DataFrame};
//! use u_diagnosys::univariate::univariate_column;
//!
//! let mut df = DataFrame::new();
//! df.add_column("LOAN", Column::from_f64s(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
//!
//! let result = univariate_column(&df, "LOAN").unwrap();
//! assert_eq!(result.median, 3.0);
//! assert!(result.render().starts_with("The UNIVARIATE Procedure"));
//! ```

pub mod class_conditional;
pub mod dataframe;
pub mod error;
pub mod format;
pub mod isolation_forest;
pub mod location;
pub mod moments;
pub mod outliers;
pub mod stat_explore;
pub mod univariate;

pub use error::{DiagnosysError, ErrorKind};
