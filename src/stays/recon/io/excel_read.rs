use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::{debug, instrument};

use crate::stays::recon::error::{ReconError, Result};
use crate::stays::recon::model::{ColumnIdentifierSet, ColumnKey, Identifier, ReserveCode};
use crate::stays::recon::normalize::{normalize_reserve_code, normalize_strict_id};

/// Scans every sheet and collects the strict identifiers held by each column.
///
/// The first row of each sheet is the header row. Columns that contain no
/// strict identifier do not appear in the result.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_column_ids(path: &Path) -> Result<ColumnIdentifierSet> {
    let mut workbook = open(path)?;
    let mut columns = ColumnIdentifierSet::default();

    for sheet_name in workbook.sheet_names().to_owned() {
        let Some(range) = read_sheet(&mut workbook, path, &sheet_name)? else {
            continue;
        };
        let headers = headers(&range);
        let mut sets: Vec<BTreeSet<Identifier>> = vec![BTreeSet::new(); headers.len()];

        for row in range.rows().skip(1) {
            for (col_idx, cell) in row.iter().take(headers.len()).enumerate() {
                if let Some(id) = normalize_strict_id(&cell_to_string(Some(cell))) {
                    sets[col_idx].insert(id);
                }
            }
        }

        debug!(sheet = %sheet_name, columns = headers.len(), "scanned sheet");
        for (header, ids) in headers.into_iter().zip(sets) {
            columns.push(ColumnKey::new(sheet_name.clone(), header), ids);
        }
    }

    Ok(columns)
}

/// Collects reserve codes from the first sheet whose header row contains
/// `column` and that yields at least one code.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), column = %column))]
pub fn read_reserve_codes(path: &Path, column: &str) -> Result<BTreeSet<ReserveCode>> {
    let mut workbook = open(path)?;
    let mut codes = BTreeSet::new();

    for sheet_name in workbook.sheet_names().to_owned() {
        let Some(range) = read_sheet(&mut workbook, path, &sheet_name)? else {
            continue;
        };
        let Some(col_idx) = headers(&range).iter().position(|header| header == column) else {
            continue;
        };

        codes.extend(
            range
                .rows()
                .skip(1)
                .filter_map(|row| row.get(col_idx))
                .filter_map(|cell| normalize_reserve_code(&cell_to_string(Some(cell)))),
        );

        if !codes.is_empty() {
            debug!(sheet = %sheet_name, count = codes.len(), "reserve codes found");
            break;
        }
    }

    Ok(codes)
}

fn open(path: &Path) -> Result<Xlsx<std::io::BufReader<std::fs::File>>> {
    if !path.exists() {
        return Err(ReconError::MissingInput(path.to_path_buf()));
    }
    open_workbook(path).map_err(|source| ReconError::ExcelRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns the sheet's cells, or `None` when the sheet has no rows.
fn read_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    path: &Path,
    name: &str,
) -> Result<Option<Range<DataType>>> {
    let Some(range_result) = workbook.worksheet_range(name) else {
        return Ok(None);
    };
    let range = range_result.map_err(|source| ReconError::ExcelRead {
        path: path.to_path_buf(),
        source,
    })?;
    if range.is_empty() {
        debug!(sheet = %name, "skipping empty sheet");
        return Ok(None);
    }
    Ok(Some(range))
}

/// Header texts of the first row; blank cells become `col_<n>` using the
/// 1-based worksheet column number. A header repeated on the same sheet is
/// suffixed with its column, as in `ID (col_5)`, so every column keeps its
/// own key.
fn headers(range: &Range<DataType>) -> Vec<String> {
    let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let Some(first_row) = range.rows().next() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    first_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let column = first_col + idx + 1;
            let header = cell_to_string(Some(cell)).trim().to_string();
            let header = if header.is_empty() {
                format!("col_{column}")
            } else {
                header
            };
            if seen.insert(header.clone()) {
                header
            } else {
                debug!(header = %header, column, "repeated header");
                format!("{header} (col_{column})")
            }
        })
        .collect()
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_workbook_is_reported_with_its_path() {
        let path = Path::new("/nonexistent/stays-export.xlsx");
        match read_column_ids(path) {
            Err(ReconError::MissingInput(reported)) => assert_eq!(reported, path),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_workbook_surfaces_parse_error() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").expect("fixture written");
        assert!(matches!(
            read_reserve_codes(&path, "Reserva"),
            Err(ReconError::ExcelRead { .. })
        ));
    }

    #[test]
    fn cell_strings_follow_value_types() {
        assert_eq!(cell_to_string(Some(&DataType::Float(12345.0))), "12345");
        assert_eq!(cell_to_string(Some(&DataType::Int(7))), "7");
        assert_eq!(cell_to_string(Some(&DataType::Empty)), "");
        assert_eq!(cell_to_string(None), "");
    }
}
