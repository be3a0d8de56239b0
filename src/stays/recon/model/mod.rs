use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::stays::recon::error::{ReconError, Result};

/// Canonical long-form reservation identifier.
///
/// Produced only by [`normalize_id`](crate::normalize::normalize_id). Strict
/// values are 24 lowercase hex characters; the loose fallback keeps any
/// trimmed value of at least eight characters as-is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier has the strict 24-hex-lowercase shape.
    pub fn is_strict(&self) -> bool {
        self.0.len() == 24
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short uppercase alphanumeric reservation code (3 to 12 characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ReserveCode(String);

impl ReserveCode {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReserveCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one spreadsheet column by sheet name and header text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColumnKey {
    pub sheet: String,
    pub header: String,
}

impl ColumnKey {
    pub fn new(sheet: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            header: header.into(),
        }
    }

    /// Parses the `Sheet::Header` form used on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        let (sheet, header) = value.split_once("::")?;
        Some(Self::new(sheet, header))
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.sheet, self.header)
    }
}

/// Strict identifiers found in one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnIds {
    pub key: ColumnKey,
    pub ids: BTreeSet<Identifier>,
}

/// Sparse `(sheet, header) -> identifiers` mapping.
///
/// Columns keep the order they were first seen during extraction (sheet
/// order, then column order), which is the order selection iterates in.
/// Columns without identifiers are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnIdentifierSet {
    columns: Vec<ColumnIds>,
}

impl ColumnIdentifierSet {
    pub(crate) fn push(&mut self, key: ColumnKey, ids: BTreeSet<Identifier>) {
        if ids.is_empty() {
            return;
        }
        // Keys are unique; a repeated key keeps the first column's ids.
        if self.get(&key).is_none() {
            self.columns.push(ColumnIds { key, ids });
        }
    }

    pub fn get(&self, key: &ColumnKey) -> Option<&BTreeSet<Identifier>> {
        self.columns
            .iter()
            .find(|column| &column.key == key)
            .map(|column| &column.ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnIds> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Inclusive check-in date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(ReconError::InvalidDateRange(format!(
                "start {from} is after end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Parses two `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let parse = |label: &str, value: &str| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| {
                ReconError::InvalidDateRange(format!("invalid {label} date {value:?}: {err}"))
            })
        };
        Self::new(parse("start", from)?, parse("end", to)?)
    }
}

/// Remote reserve codes plus the row id each code was first seen on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReserveCodeIndex {
    pub row_ids: BTreeMap<ReserveCode, String>,
    pub codes: BTreeSet<ReserveCode>,
}
