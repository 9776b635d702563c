//! Error types for `tally-ingest`.

use thiserror::Error;

/// Failure of a whole pipeline step.
///
/// Per-file failures never surface here; they are caught at the unit
/// boundary, logged, and counted in the step's report.
#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a single recognize/resolve/record unit, carried across the
/// generic store and engine seams as boxed errors.
#[derive(Debug, Error)]
pub enum UnitError {
  #[error("recognition failed: {0}")]
  Recognize(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store operation failed: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}
