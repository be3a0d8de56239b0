//! Core library for the stays-recon command line application.
//!
//! The library reconciles a channel-manager spreadsheet export against the
//! reservation records held in a paginated REST store. Identifier
//! canonicalisation lives in [`stays::recon::normalize`], the data sources'
//! adapters under [`stays::recon::io`], heuristic column detection in
//! [`stays::recon::select`], and the diff plus its rendering in
//! [`stays::recon::report`]. [`stays::recon::compare`] ties them together.

pub mod stays;

pub use stays::recon::{
    ReconError, Result, compare, config, error, io, model, normalize, report, select,
};
