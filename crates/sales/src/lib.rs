//! Sales history module.
//!
//! Holds the append-only sales observation record and the mapping from
//! uploaded tabular rows to observations.

pub mod ingest;
pub mod observation;

pub use ingest::{parse_csv, IngestError, REQUIRED_COLUMNS};
pub use observation::{SalesObservation, CSV_UPLOAD_SOURCE};
