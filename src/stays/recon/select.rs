//! Heuristic detection of the spreadsheet column holding reservation ids.
//!
//! The export schema is not stable, so the column is chosen by how many of
//! its identifiers also exist remotely. Equal overlaps fall back to the
//! column whose size is closest to the expected monthly volume, and any
//! remaining tie keeps the column seen first during extraction.

use std::collections::BTreeSet;

use tracing::debug;

use crate::stays::recon::error::{ReconError, Result};
use crate::stays::recon::model::{ColumnIdentifierSet, ColumnKey, Identifier};

/// Default expected number of reservations in one export.
pub const DEFAULT_EXPECTED_CARDINALITY: usize = 498;

/// Tuning for [`select_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Column size preferred when overlaps tie.
    pub expected_cardinality: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            expected_cardinality: DEFAULT_EXPECTED_CARDINALITY,
        }
    }
}

/// The column picked as the identifier column.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedColumn {
    pub key: ColumnKey,
    pub ids: BTreeSet<Identifier>,
    /// Number of the column's identifiers also present in the reference set.
    pub overlap: usize,
}

/// Outcome of column selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Column(SelectedColumn),
    /// No column held a single strict identifier.
    NoEligibleColumn,
}

/// Picks the column with the largest overlap with `reference`.
pub fn select_column(
    columns: &ColumnIdentifierSet,
    reference: &BTreeSet<Identifier>,
    config: SelectorConfig,
) -> Selection {
    let distance = |size: usize| size.abs_diff(config.expected_cardinality);
    let mut best: Option<(&ColumnKey, &BTreeSet<Identifier>, usize)> = None;

    for column in columns.iter() {
        let overlap = column.ids.intersection(reference).count();
        debug!(column = %column.key, overlap, size = column.ids.len(), "scored column");

        let better = match best {
            None => true,
            Some((_, best_ids, best_overlap)) => {
                overlap > best_overlap
                    || (overlap == best_overlap
                        && distance(column.ids.len()) < distance(best_ids.len()))
            }
        };
        if better {
            best = Some((&column.key, &column.ids, overlap));
        }
    }

    match best {
        Some((key, ids, overlap)) => Selection::Column(SelectedColumn {
            key: key.clone(),
            ids: ids.clone(),
            overlap,
        }),
        None => Selection::NoEligibleColumn,
    }
}

/// Uses a caller-named column instead of the heuristic.
pub fn explicit_column(
    columns: &ColumnIdentifierSet,
    key: &ColumnKey,
    reference: &BTreeSet<Identifier>,
) -> Result<SelectedColumn> {
    let ids = columns
        .get(key)
        .ok_or_else(|| ReconError::UnknownColumn(key.to_string()))?;
    Ok(SelectedColumn {
        key: key.clone(),
        ids: ids.clone(),
        overlap: ids.intersection(reference).count(),
    })
}
