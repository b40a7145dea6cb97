//! Classification and aggregation for energy-audit measure tables.
//!
//! The pipeline: [`loader`] normalizes a raw CSV export into
//! [`types::MeasureRecord`]s, [`classify`] assigns every record a category
//! under a selectable [`classify::Scheme`], [`filter`] narrows the dataset
//! to a region/center [`filter::Selection`], and [`aggregate`] turns the
//! filtered working set into report rows that [`output`] previews and saves.

pub mod aggregate;
pub mod classify;
pub mod codes;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod types;
pub mod util;

pub use classify::Scheme;
pub use error::{AuditError, Result};
pub use filter::Selection;
pub use types::{ClassifiedMeasure, MeasureRecord};
