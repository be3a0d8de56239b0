//! Adapters for the two data sources: the exported workbook and the
//! paginated REST store.

pub mod excel_read;
pub mod remote;
