pub mod compare;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod normalize;
pub mod report;
pub mod select;

pub use error::{ReconError, Result};
