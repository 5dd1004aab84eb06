//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `sqlite`: SQLite for local storage
//! - `csv_export`: CSV files of stored assessments
//! - `sanitize`: PII filtering for logs

pub mod csv_export;
pub mod sanitize;
pub mod sqlite;

pub use csv_export::ExportError;
pub use sqlite::{SqliteStorage, StorageError};
