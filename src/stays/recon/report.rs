//! Set differences between the two sides and their rendering.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::stays::recon::model::ColumnKey;

/// Default number of entries listed per difference.
pub const DEFAULT_PREVIEW: usize = 50;

/// One-sided differences between a spreadsheet set and a remote set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<T> {
    pub spreadsheet_count: usize,
    pub remote_count: usize,
    /// Sorted ascending.
    pub only_in_remote: Vec<T>,
    /// Sorted ascending.
    pub only_in_spreadsheet: Vec<T>,
}

impl<T: Ord + Clone> Reconciliation<T> {
    pub fn compute(spreadsheet: &BTreeSet<T>, remote: &BTreeSet<T>) -> Self {
        Self {
            spreadsheet_count: spreadsheet.len(),
            remote_count: remote.len(),
            only_in_remote: remote.difference(spreadsheet).cloned().collect(),
            only_in_spreadsheet: spreadsheet.difference(remote).cloned().collect(),
        }
    }
}

impl<T> Reconciliation<T> {
    pub fn is_clean(&self) -> bool {
        self.only_in_remote.is_empty() && self.only_in_spreadsheet.is_empty()
    }
}

/// Which identifier family a report compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    ReserveCodes,
    ExternalIds,
}

impl IdentifierKind {
    fn counter_suffix(self) -> &'static str {
        match self {
            IdentifierKind::ReserveCodes => "RESERVA_CODES",
            IdentifierKind::ExternalIds => "EXTERNAL_IDS",
        }
    }

    fn label(self) -> &'static str {
        match self {
            IdentifierKind::ReserveCodes => "Reserva codes",
            IdentifierKind::ExternalIds => "external ids",
        }
    }
}

/// Column chosen on the spreadsheet side, when one was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub column: ColumnKey,
    pub overlap: usize,
    pub ids_in_column: usize,
}

/// One identifier present on only one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_row_id: Option<String>,
}

/// Renderable result of one comparison run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub kind: IdentifierKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_column: Option<ColumnSummary>,
    pub spreadsheet_count: usize,
    pub remote_count: usize,
    pub only_in_remote: Vec<Discrepancy>,
    pub only_in_spreadsheet: Vec<Discrepancy>,
}

impl Report {
    /// Builds a report, attaching remote row ids where `row_ids` knows them.
    pub fn new<T: fmt::Display + Ord>(
        kind: IdentifierKind,
        reconciliation: &Reconciliation<T>,
        row_ids: &BTreeMap<T, String>,
    ) -> Self {
        let entries = |items: &[T], with_refs: bool| {
            items
                .iter()
                .map(|item| Discrepancy {
                    id: item.to_string(),
                    remote_row_id: with_refs.then(|| row_ids.get(item).cloned()).flatten(),
                })
                .collect::<Vec<_>>()
        };
        Self {
            kind,
            selected_column: None,
            spreadsheet_count: reconciliation.spreadsheet_count,
            remote_count: reconciliation.remote_count,
            only_in_remote: entries(&reconciliation.only_in_remote, true),
            only_in_spreadsheet: entries(&reconciliation.only_in_spreadsheet, false),
        }
    }

    pub fn with_column(mut self, column: ColumnSummary) -> Self {
        self.selected_column = Some(column);
        self
    }

    pub fn is_clean(&self) -> bool {
        self.only_in_remote.is_empty() && self.only_in_spreadsheet.is_empty()
    }

    /// Plain-text rendering listing at most `preview` entries per side.
    pub fn text(&self, preview: usize) -> TextReport<'_> {
        TextReport {
            report: self,
            preview,
        }
    }

    pub fn render_text(&self, preview: usize) -> String {
        self.text(preview).to_string()
    }
}

/// [`Report`] borrowed for plain-text display; see [`Report::text`].
pub struct TextReport<'a> {
    report: &'a Report,
    preview: usize,
}

impl TextReport<'_> {
    fn section(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        entries: &[Discrepancy],
    ) -> fmt::Result {
        if entries.is_empty() {
            return Ok(());
        }
        writeln!(f, "\n{title} ({}):", self.report.kind.label())?;
        for entry in entries.iter().take(self.preview) {
            match &entry.remote_row_id {
                Some(row_id) => writeln!(f, "{} -> reservationId={row_id}", entry.id)?,
                None => writeln!(f, "{}", entry.id)?,
            }
        }
        if entries.len() > self.preview {
            writeln!(f, "... and {} more", entries.len() - self.preview)?;
        }
        Ok(())
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let suffix = report.kind.counter_suffix();

        if let Some(column) = &report.selected_column {
            writeln!(
                f,
                "Selected column: {} (overlapWithSupabase={}, idsInColumn={})",
                column.column, column.overlap, column.ids_in_column
            )?;
        }
        writeln!(f, "XLSX_{suffix}={}", report.spreadsheet_count)?;
        writeln!(f, "SUPABASE_{suffix}={}", report.remote_count)?;
        writeln!(f, "ONLY_IN_SUPABASE={}", report.only_in_remote.len())?;
        writeln!(f, "ONLY_IN_XLSX={}", report.only_in_spreadsheet.len())?;

        self.section(f, "EXTRA_IN_SUPABASE", &report.only_in_remote)?;
        self.section(f, "MISSING_IN_SUPABASE", &report.only_in_spreadsheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn equal_sets_are_clean() {
        let both = set(&["A1B", "C2D"]);
        let recon = Reconciliation::compute(&both, &both);
        assert!(recon.is_clean());
        assert_eq!(recon.spreadsheet_count, 2);
        let report = Report::new(IdentifierKind::ReserveCodes, &recon, &BTreeMap::new());
        assert!(report.is_clean());
        let text = report.render_text(DEFAULT_PREVIEW);
        assert!(text.contains("ONLY_IN_SUPABASE=0"));
        assert!(!text.contains("EXTRA_IN_SUPABASE"));
    }

    #[test]
    fn differences_are_sorted_and_cross_referenced() {
        let xlsx = set(&["ZZZ999", "EU26J", "AAA111"]);
        let remote = set(&["EU26J", "QQQ1", "BBB2"]);
        let recon = Reconciliation::compute(&xlsx, &remote);
        assert_eq!(recon.only_in_remote, vec!["BBB2", "QQQ1"]);
        assert_eq!(recon.only_in_spreadsheet, vec!["AAA111", "ZZZ999"]);

        let row_ids = BTreeMap::from([("QQQ1".to_string(), "res-7".to_string())]);
        let report = Report::new(IdentifierKind::ReserveCodes, &recon, &row_ids);
        let text = report.render_text(DEFAULT_PREVIEW);
        assert!(text.contains("XLSX_RESERVA_CODES=3"));
        assert!(text.contains(
            "EXTRA_IN_SUPABASE (Reserva codes):\nBBB2\nQQQ1 -> reservationId=res-7\n"
        ));
        assert!(text.contains("MISSING_IN_SUPABASE (Reserva codes):\nAAA111\nZZZ999\n"));
    }

    #[test]
    fn preview_truncates_long_lists() {
        let xlsx: BTreeSet<String> = (0..60).map(|n| format!("C{n:03}")).collect();
        let recon = Reconciliation::compute(&xlsx, &BTreeSet::new());
        let report = Report::new(IdentifierKind::ExternalIds, &recon, &BTreeMap::new());
        let text = report.render_text(50);
        assert!(text.contains("C049\n"));
        assert!(!text.contains("C050"));
        assert!(text.contains("... and 10 more"));
    }

    #[test]
    fn text_display_matches_rendered_string() {
        let recon = Reconciliation::compute(&set(&["A1B", "Z9Z"]), &set(&["A1B"]));
        let report = Report::new(IdentifierKind::ReserveCodes, &recon, &BTreeMap::new());
        let out = format!("{}", report.text(1));
        assert_eq!(out, report.render_text(1));
        assert!(out.ends_with("MISSING_IN_SUPABASE (Reserva codes):\nZ9Z\n"));
    }

    #[test]
    fn json_rendering_includes_selected_column() {
        let recon = Reconciliation::compute(&set(&["x"]), &set(&["x"]));
        let report = Report::new(IdentifierKind::ExternalIds, &recon, &BTreeMap::new()).with_column(
            ColumnSummary {
                column: ColumnKey::new("Reservas", "ID"),
                overlap: 1,
                ids_in_column: 1,
            },
        );
        let json = serde_json::to_value(&report).expect("serialised");
        assert_eq!(json["kind"], "external_ids");
        assert_eq!(json["selected_column"]["column"]["header"], "ID");
        assert_eq!(json["only_in_remote"], serde_json::json!([]));
    }
}
