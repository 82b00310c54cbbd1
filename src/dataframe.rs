//! Column-major DataFrame for tabular data.
//!
//! The [`DataFrame`] is the dataset every analysis in this crate reads.
//! Columns are typed, and a compact validity bitmap tracks missing values.
//! A `NaN` stored in a valid numeric slot is also treated as missing, so
//! data arriving with pandas-style `NaN` markers behaves the same way as
//! data with explicit nulls.
//!
//! # Column Types
//!
//! | Type | Storage | Use case |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | Continuous/integer values |
//! | [`Boolean`](Column::Boolean) | `Vec<bool>` + bitmap | True/false values |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` | Low-cardinality strings |
//! | [`Text`](Column::Text) | `Vec<String>` + bitmap | High-cardinality strings |
//!
//! # Example
//!
//! ```
//! use u_diagnosys::dataframe::{Column, DataFrame};
//!
//! let mut df = DataFrame::new();
//! df.add_column("LOAN", Column::from_f64s(vec![1000.0, 2000.0, f64::NAN])).unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.column_by_name("LOAN").unwrap().missing_count(), 1);
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DiagnosysError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// Bit-packed validity bitmap; bit `i` is 1 when row `i` holds a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap where all `len` positions are valid.
    pub fn all_valid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        let mut bits = vec![u64::MAX; n_words];
        let trailing = len % 64;
        if trailing != 0 && n_words > 0 {
            bits[n_words - 1] = (1u64 << trailing) - 1;
        }
        Self { bits, len }
    }

    /// Creates an empty bitmap with no rows.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            len: 0,
        }
    }

    /// Returns `true` if the value at `idx` is present.
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        (self.bits[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Marks position `idx` as missing.
    #[inline]
    pub fn set_invalid(&mut self, idx: usize) {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        self.bits[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Appends a new position.
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        if idx / 64 >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
    }

    /// Returns the total number of tracked positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitmap tracks zero positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts the number of missing positions.
    pub fn null_count(&self) -> usize {
        let valid: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - valid
    }

    /// Builds a new bitmap by picking positions in `indices` order.
    fn take(&self, indices: &[usize]) -> Self {
        let mut out = Self::empty();
        for &i in indices {
            out.push(self.is_valid(i));
        }
        out
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Continuous or integer numeric values (stored as `f64`).
    Numeric,
    /// Boolean (true/false) values.
    Boolean,
    /// Low-cardinality strings (dictionary-encoded).
    Categorical,
    /// High-cardinality or free-form text.
    Text,
}

// ── GroupKey ──────────────────────────────────────────────────────────

/// A grouping level taken as-is from a column cell.
///
/// Keys order deterministically: numbers by IEEE total order, `false`
/// before `true`, strings lexicographically.
#[derive(Debug, Clone)]
pub enum GroupKey {
    Number(f64),
    Flag(bool),
    Label(String),
}

impl GroupKey {
    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Flag(_) => 1,
            Self::Label(_) => 2,
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Flag(a), Self::Flag(b)) => a.cmp(b),
            (Self::Label(a), Self::Label(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Label(s) => write!(f, "{s}"),
        }
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column with validity bitmap for missing values.
///
/// Invalid positions hold a placeholder (0.0, false, empty string, or
/// dictionary index 0) that is never read.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dense `f64` values.
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    /// Boolean values.
    Boolean {
        values: Vec<bool>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded categorical column.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    /// Free-form text column.
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(values: Vec<f64>, validity: ValidityBitmap) -> Self {
        Self::Numeric { values, validity }
    }

    /// Creates a numeric column where every `NaN` marks a missing value.
    pub fn from_f64s(values: Vec<f64>) -> Self {
        let mut validity = ValidityBitmap::empty();
        for v in &values {
            validity.push(!v.is_nan());
        }
        Self::Numeric { values, validity }
    }

    /// Creates a numeric column from optional cells (`None` = missing).
    pub fn from_options(cells: Vec<Option<f64>>) -> Self {
        let mut validity = ValidityBitmap::empty();
        let values = cells
            .into_iter()
            .map(|c| {
                validity.push(c.is_some());
                c.unwrap_or(0.0)
            })
            .collect();
        Self::Numeric { values, validity }
    }

    /// Creates a boolean column.
    pub fn boolean(values: Vec<bool>, validity: ValidityBitmap) -> Self {
        Self::Boolean { values, validity }
    }

    /// Creates a categorical column from a dictionary and indices.
    pub fn categorical(dictionary: Vec<String>, indices: Vec<u32>, validity: ValidityBitmap) -> Self {
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Creates a text column with every cell present.
    pub fn text<S: Into<String>>(values: Vec<S>) -> Self {
        let validity = ValidityBitmap::all_valid(values.len());
        Self::Text {
            values: values.into_iter().map(Into::into).collect(),
            validity,
        }
    }

    /// Returns the data type of this column.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Boolean { .. } => DataType::Boolean,
            Self::Categorical { .. } => DataType::Categorical,
            Self::Text { .. } => DataType::Text,
        }
    }

    /// Returns the number of rows in this column.
    pub fn len(&self) -> usize {
        self.validity().len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the validity bitmap.
    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Boolean { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. } => validity,
        }
    }

    /// Returns `true` if row `idx` holds a usable value.
    pub fn is_present(&self, idx: usize) -> bool {
        match self {
            Self::Numeric { values, validity } => validity.is_valid(idx) && !values[idx].is_nan(),
            _ => self.validity().is_valid(idx),
        }
    }

    /// Number of missing cells (nulls and, for numeric columns, `NaN`s).
    pub fn missing_count(&self) -> usize {
        match self {
            Self::Numeric { .. } => (0..self.len()).filter(|&i| !self.is_present(i)).count(),
            _ => self.validity().null_count(),
        }
    }

    /// Returns the raw numeric storage, or `None` if not a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Returns the numeric value at `idx`, `None` when missing or non-numeric.
    pub fn numeric_at(&self, idx: usize) -> Option<f64> {
        match self {
            Self::Numeric { values, .. } if self.is_present(idx) => Some(values[idx]),
            _ => None,
        }
    }

    /// Present numeric values paired with their row positions.
    ///
    /// Returns `None` for non-numeric columns.
    pub fn numeric_observations(&self) -> Option<Vec<(usize, f64)>> {
        let values = self.as_numeric()?;
        Some(
            (0..values.len())
                .filter(|&i| self.is_present(i))
                .map(|i| (i, values[i]))
                .collect(),
        )
    }

    /// Present numeric values (missing excluded), or `None` if not numeric.
    pub fn present_numeric_values(&self) -> Option<Vec<f64>> {
        self.numeric_observations()
            .map(|obs| obs.into_iter().map(|(_, v)| v).collect())
    }

    /// Returns the grouping key held at row `idx`, `None` when missing.
    pub fn group_key_at(&self, idx: usize) -> Option<GroupKey> {
        if !self.is_present(idx) {
            return None;
        }
        match self {
            // -0.0 and 0.0 are one level
            Self::Numeric { values, .. } => Some(GroupKey::Number(values[idx] + 0.0)),
            Self::Boolean { values, .. } => Some(GroupKey::Flag(values[idx])),
            Self::Categorical {
                dictionary,
                indices,
                ..
            } => dictionary
                .get(indices[idx] as usize)
                .map(|s| GroupKey::Label(s.clone())),
            Self::Text { values, .. } => Some(GroupKey::Label(values[idx].clone())),
        }
    }

    /// Builds a new column by picking rows in `indices` order.
    pub fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Numeric { values, validity } => Self::Numeric {
                values: indices.iter().map(|&i| values[i]).collect(),
                validity: validity.take(indices),
            },
            Self::Boolean { values, validity } => Self::Boolean {
                values: indices.iter().map(|&i| values[i]).collect(),
                validity: validity.take(indices),
            },
            Self::Categorical {
                dictionary,
                indices: codes,
                validity,
            } => Self::Categorical {
                dictionary: dictionary.clone(),
                indices: indices.iter().map(|&i| codes[i]).collect(),
                validity: validity.take(indices),
            },
            Self::Text { values, validity } => Self::Text {
                values: indices.iter().map(|&i| values[i].clone()).collect(),
                validity: validity.take(indices),
            },
        }
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Column-major tabular data structure.
///
/// All columns share the same row count. Every analysis treats a
/// `DataFrame` as read-only; operations that augment data return a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Creates an empty DataFrame with no columns or rows.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Adds a named column.
    ///
    /// Returns an error if the column length doesn't match the existing
    /// row count (unless this is the first column).
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), DiagnosysError> {
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(DiagnosysError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name.into());
        self.columns.push(column);
        Ok(())
    }

    /// Returns a copy with `column` appended (or replacing a same-named one).
    pub fn with_column(&self, name: &str, column: Column) -> Result<Self, DiagnosysError> {
        let mut out = self.clone();
        match out.column_index(name) {
            Some(i) if column.len() == out.row_count => out.columns[i] = column,
            Some(_) => {
                return Err(DiagnosysError::DimensionMismatch {
                    expected: out.row_count,
                    actual: column.len(),
                })
            }
            None => out.add_column(name, column)?,
        }
        Ok(out)
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the DataFrame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns a reference to the column with the given `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Returns the column named `name` or a `MissingColumns` error.
    pub fn require_column(&self, name: &str) -> Result<&Column, DiagnosysError> {
        self.column_by_name(name)
            .ok_or_else(|| DiagnosysError::MissingColumns {
                names: vec![name.to_string()],
            })
    }

    /// Returns the index of the column with the given `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns the subset of `names` that are not columns of this frame,
    /// preserving request order.
    pub fn missing_columns<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| self.column_index(n).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Returns an iterator over (name, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(|s| s.as_str()).zip(self.columns.iter())
    }

    /// Returns the numeric columns, in column order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.iter()
            .filter(|(_, c)| c.data_type() == DataType::Numeric)
    }

    /// Partitions row indices by the key held in column `key_column`.
    ///
    /// Rows whose key is missing are left out of every group; the count of
    /// such rows is returned alongside the groups. Groups iterate in
    /// ascending key order and keep row order within each group.
    pub fn group_rows(
        &self,
        key_column: &str,
    ) -> Result<(BTreeMap<GroupKey, Vec<usize>>, usize), DiagnosysError> {
        let keys = self.require_column(key_column)?;
        let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        let mut dropped = 0usize;
        for row in 0..self.row_count {
            match keys.group_key_at(row) {
                Some(key) => groups.entry(key).or_default().push(row),
                None => dropped += 1,
            }
        }
        Ok((groups, dropped))
    }

    /// Returns a copy whose rows are picked in `indices` order.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
        }
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn loan_frame() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column(
            "LOAN",
            Column::from_f64s(vec![1000.0, 2000.0, 3000.0, f64::NAN]),
        )
        .unwrap();
        df.add_column("BAD", Column::from_f64s(vec![0.0, 0.0, 1.0, 1.0]))
            .unwrap();
        df.add_column("JOB", Column::text(vec!["Mgr", "Sales", "Mgr", "Other"]))
            .unwrap();
        df
    }

    // ── ValidityBitmap ───────────────────────────────────────────

    #[test]
    fn bitmap_boundary_64() {
        let bm = ValidityBitmap::all_valid(64);
        assert_eq!(bm.bits.len(), 1);
        assert_eq!(bm.null_count(), 0);

        let bm65 = ValidityBitmap::all_valid(65);
        assert_eq!(bm65.bits.len(), 2);
        assert!(bm65.is_valid(64));
    }

    #[test]
    fn bitmap_push_and_take() {
        let mut bm = ValidityBitmap::empty();
        for i in 0..130 {
            bm.push(i % 3 != 0);
        }
        assert_eq!(bm.null_count(), (0..130).filter(|i| i % 3 == 0).count());
        let taken = bm.take(&[0, 1, 129]);
        assert_eq!(taken.len(), 3);
        assert!(!taken.is_valid(0));
        assert!(taken.is_valid(1));
        assert!(taken.is_valid(2));
    }

    // ── Column ───────────────────────────────────────────────────

    #[test]
    fn nan_counts_as_missing() {
        let col = Column::from_f64s(vec![1.0, f64::NAN, 3.0]);
        assert_eq!(col.missing_count(), 1);
        assert_eq!(col.len() - col.missing_count(), 2);
        assert_eq!(col.present_numeric_values(), Some(vec![1.0, 3.0]));
        assert_eq!(col.numeric_observations(), Some(vec![(0, 1.0), (2, 3.0)]));
    }

    #[test]
    fn nan_in_valid_slot_is_missing() {
        let col = Column::numeric(vec![f64::NAN, 2.0], ValidityBitmap::all_valid(2));
        assert!(!col.is_present(0));
        assert_eq!(col.numeric_at(1), Some(2.0));
    }

    #[test]
    fn from_options_marks_nulls() {
        let col = Column::from_options(vec![Some(1.0), None]);
        assert_eq!(col.missing_count(), 1);
        assert_eq!(col.numeric_at(1), None);
    }

    #[test]
    fn categorical_group_keys() {
        let mut validity = ValidityBitmap::all_valid(3);
        validity.set_invalid(1);
        let col = Column::categorical(vec!["a".into(), "b".into()], vec![1, 0, 0], validity);
        assert_eq!(col.group_key_at(0), Some(GroupKey::Label("b".into())));
        assert_eq!(col.group_key_at(1), None);
        assert_eq!(col.missing_count(), 1);
        assert_eq!(col.data_type(), DataType::Categorical);
    }

    #[test]
    fn group_key_order() {
        let mut keys = vec![
            GroupKey::Number(1.0),
            GroupKey::Number(-0.5),
            GroupKey::Number(0.0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                GroupKey::Number(-0.5),
                GroupKey::Number(0.0),
                GroupKey::Number(1.0)
            ]
        );
        assert!(GroupKey::Flag(false) < GroupKey::Flag(true));
        assert_eq!(GroupKey::Number(1.0).to_string(), "1");
    }

    #[test]
    fn take_reorders_every_type() {
        let mut bools = ValidityBitmap::all_valid(2);
        bools.set_invalid(0);
        let col = Column::boolean(vec![false, true], bools);
        let taken = col.take(&[1, 0]);
        assert_eq!(taken.group_key_at(0), Some(GroupKey::Flag(true)));
        assert_eq!(taken.group_key_at(1), None);
    }

    // ── DataFrame ────────────────────────────────────────────────

    #[test]
    fn column_length_mismatch() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::from_f64s(vec![1.0, 2.0])).unwrap();
        let result = df.add_column("y", Column::from_f64s(vec![1.0, 2.0, 3.0]));
        assert!(matches!(
            result,
            Err(DiagnosysError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn missing_columns_keeps_request_order() {
        let df = loan_frame();
        assert_eq!(
            df.missing_columns(&["MORTDUE", "LOAN", "CLAGE"]),
            vec!["MORTDUE".to_string(), "CLAGE".to_string()]
        );
        assert!(df.missing_columns(&["LOAN", "BAD"]).is_empty());
    }

    #[test]
    fn numeric_columns_skip_text() {
        let df = loan_frame();
        let names: Vec<&str> = df.numeric_columns().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["LOAN", "BAD"]);
    }

    #[test]
    fn group_rows_ascending_and_drops_missing_keys() {
        let mut df = DataFrame::new();
        df.add_column("k", Column::from_f64s(vec![1.0, 0.0, f64::NAN, 1.0]))
            .unwrap();
        let (groups, dropped) = df.group_rows("k").unwrap();
        assert_eq!(dropped, 1);
        let keys: Vec<&GroupKey> = groups.keys().collect();
        assert_eq!(keys, vec![&GroupKey::Number(0.0), &GroupKey::Number(1.0)]);
        assert_eq!(groups[&GroupKey::Number(1.0)], vec![0, 3]);
    }

    #[test]
    fn take_rows_and_with_column() {
        let df = loan_frame();
        let reordered = df.take_rows(&[3, 0]);
        assert_eq!(reordered.row_count(), 2);
        let loan = reordered.column_by_name("LOAN").unwrap();
        assert_eq!(loan.numeric_at(0), None);
        assert_eq!(loan.numeric_at(1), Some(1000.0));

        let augmented = df
            .with_column("score", Column::from_f64s(vec![0.1, 0.2, 0.3, 0.4]))
            .unwrap();
        assert_eq!(augmented.column_count(), 4);
        assert_eq!(df.column_count(), 3);
    }

    #[test]
    fn require_column_error() {
        let df = loan_frame();
        assert_eq!(
            df.require_column("nope").unwrap_err(),
            DiagnosysError::MissingColumns {
                names: vec!["nope".into()]
            }
        );
    }
}
