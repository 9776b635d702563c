//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Any failure surfaced by the underlying connection, including a failed
  /// migration. A migration failure leaves the store at its last good
  /// version; callers must treat it as fatal and not proceed to ingestion.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
