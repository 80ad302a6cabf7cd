//! `saldo-recon`: account-key normalization and balance reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded records from accounting ledgers and
//! bank statements, returns reconciled rows, a shaped report and diagnostics.
//! File access and rendering live in the CLI.

pub mod aggregate;
pub mod coerce;
pub mod config;
pub mod difference;
pub mod engine;
pub mod error;
pub mod join;
pub mod model;
pub mod normalize;
pub mod shape;
pub mod source;
pub mod summary;
pub mod translate;

pub use config::{JoinMode, ReconConfig};
pub use engine::{load_translation, run};
pub use error::ReconError;
pub use model::{ReconInput, ReconResult, ReconciledRow};
pub use normalize::KeyNormalizer;
pub use source::load_csv_records;
pub use translate::TranslationTable;
