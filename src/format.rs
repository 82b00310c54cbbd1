//! Fixed-width cell formatting shared by the text reports.
//!
//! Undefined statistics (`NaN`, `±∞`) render as the legacy missing marker
//! `.` so downstream scrapers see a single token per cell.

use std::fmt;

/// A structured analysis result paired with its rendered text.
#[derive(Debug, Clone)]
pub struct Report<T> {
    pub result: T,
    pub text: String,
}

impl<T> fmt::Display for Report<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Marker printed in place of an undefined number.
pub const MISSING: &str = ".";

/// Formats `v` with `precision` decimals, or [`MISSING`] when undefined.
pub fn number(v: f64, precision: usize) -> String {
    if v.is_finite() {
        format!("{v:.precision$}")
    } else {
        MISSING.to_string()
    }
}

/// Right-aligns `v` in a cell of `width` characters.
pub fn right(v: f64, precision: usize, width: usize) -> String {
    format!("{:>width$}", number(v, precision))
}
