use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::stays::recon::error::Result;
use crate::stays::recon::io::excel_read;
use crate::stays::recon::io::remote::{PageSource, RemoteFetcher};
use crate::stays::recon::model::{ColumnKey, DateRange, Identifier};
use crate::stays::recon::report::{ColumnSummary, IdentifierKind, Reconciliation, Report};
use crate::stays::recon::select::{self, SelectedColumn, Selection, SelectorConfig};

/// Both sides agree.
pub const EXIT_CLEAN: i32 = 0;
/// At least one identifier exists on only one side.
pub const EXIT_DIFFERENCES: i32 = 1;
/// Configuration, parse or network failure.
pub const EXIT_FAILURE: i32 = 2;
/// No spreadsheet column held an eligible identifier.
pub const EXIT_NO_ELIGIBLE_COLUMN: i32 = 3;

/// Remote-side query parameters shared by both comparison modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteScope {
    pub range: DateRange,
    /// Restrict to rows carrying an `external_id` (imported reservations).
    pub only_imported: bool,
}

/// How the spreadsheet identifier column is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnChoice {
    Auto(SelectorConfig),
    Explicit(ColumnKey),
}

/// Result of a comparison run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Compared(Report),
    NoEligibleColumn,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Compared(report) if report.is_clean() => EXIT_CLEAN,
            Outcome::Compared(_) => EXIT_DIFFERENCES,
            Outcome::NoEligibleColumn => EXIT_NO_ELIGIBLE_COLUMN,
        }
    }
}

/// Compares the named code column of the workbook with the reserve codes
/// embedded in remote `external_url`s.
#[instrument(
    level = "info",
    skip_all,
    fields(
        input = %input.display(),
        code_column = %code_column,
        from = %scope.range.from,
        to = %scope.range.to
    )
)]
pub fn compare_reserve_codes<S: PageSource>(
    input: &Path,
    code_column: &str,
    fetcher: &mut RemoteFetcher<S>,
    scope: RemoteScope,
) -> Result<Outcome> {
    let xlsx_codes = excel_read::read_reserve_codes(input, code_column)?;
    info!(count = xlsx_codes.len(), "read reserve codes from workbook");
    if xlsx_codes.is_empty() {
        warn!(column = code_column, "no reserve codes found in any sheet");
    }

    let index = fetcher.fetch_reserve_codes(scope.range, scope.only_imported)?;
    let reconciliation = Reconciliation::compute(&xlsx_codes, &index.codes);
    Ok(Outcome::Compared(Report::new(
        IdentifierKind::ReserveCodes,
        &reconciliation,
        &index.row_ids,
    )))
}

/// Compares the workbook's identifier column with remote `external_id`s.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), from = %scope.range.from, to = %scope.range.to)
)]
pub fn compare_external_ids<S: PageSource>(
    input: &Path,
    choice: &ColumnChoice,
    fetcher: &mut RemoteFetcher<S>,
    scope: RemoteScope,
) -> Result<Outcome> {
    let columns = excel_read::read_column_ids(input)?;
    info!(columns = columns.len(), "extracted identifier columns");

    let remote: BTreeSet<Identifier> = fetcher
        .fetch_external_ids(scope.range, scope.only_imported)?
        .into_iter()
        .collect();

    let selected: SelectedColumn = match choice {
        ColumnChoice::Auto(config) => match select::select_column(&columns, &remote, *config) {
            Selection::Column(column) => column,
            Selection::NoEligibleColumn => {
                warn!("no column holds 24-hex identifiers");
                return Ok(Outcome::NoEligibleColumn);
            }
        },
        ColumnChoice::Explicit(key) => select::explicit_column(&columns, key, &remote)?,
    };
    info!(column = %selected.key, overlap = selected.overlap, "selected identifier column");

    let reconciliation = Reconciliation::compute(&selected.ids, &remote);
    let summary = ColumnSummary {
        column: selected.key,
        overlap: selected.overlap,
        ids_in_column: selected.ids.len(),
    };
    let report = Report::new(IdentifierKind::ExternalIds, &reconciliation, &Default::default())
        .with_column(summary);
    Ok(Outcome::Compared(report))
}
