//! The ingestion orchestrator: serialized recognize, resolve, record.
//!
//! The recognition engine is a shared, stateful singleton that cannot
//! service concurrent calls, so candidates are processed one at a time; the
//! loop is a concurrency-1 work queue. The engine is taken by value and
//! consumed on the way out, so every exit path, including the
//! zero-candidate one, releases it exactly once.

use std::path::Path;

use tally_core::{
  capture::CaptureId,
  recognize::{Recognizer, alias_from_text},
  store::CaptureStore,
};
use tracing::{info, warn};

use crate::{Result, error::UnitError};

/// Outcome counts for one ingestion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
  pub recorded: usize,
  pub skipped:  usize,
  pub failed:   usize,
}

enum Unit {
  Recorded { alias: String, player_id: i64 },
  AlreadyRecorded,
}

/// Record every capture in `normalized_dir` not yet present in the store,
/// then release the recognition engine.
pub async fn ingest<S, R>(store: &S, engine: R, normalized_dir: &Path) -> Result<IngestReport>
where
  S: CaptureStore,
  R: Recognizer,
{
  let outcome = run(store, &engine, normalized_dir).await;
  engine.shutdown().await;
  outcome
}

async fn run<S, R>(store: &S, engine: &R, normalized_dir: &Path) -> Result<IngestReport>
where
  S: CaptureStore,
  R: Recognizer,
{
  let mut report = IngestReport::default();

  // Candidates are taken in listing order; ids are expected to be sortable
  // timestamp tokens but no ordering is imposed here.
  let mut entries = tokio::fs::read_dir(normalized_dir).await?;
  while let Some(entry) = entries.next_entry().await? {
    let name = entry.file_name().to_string_lossy().into_owned();
    let id = CaptureId::from_file_name(&name);

    match process_one(store, engine, &entry.path(), &id).await {
      Ok(Unit::Recorded { alias, player_id }) => {
        report.recorded += 1;
        info!(capture = %id, %alias, player_id, "recorded capture");
      }
      Ok(Unit::AlreadyRecorded) => report.skipped += 1,
      Err(error) => {
        report.failed += 1;
        warn!(file = %name, %error, "capture ingestion failed");
      }
    }
  }

  info!(
    recorded = report.recorded,
    skipped = report.skipped,
    failed = report.failed,
    "ingestion pass complete"
  );

  Ok(report)
}

/// One unit of work: recorded-check, recognize, resolve, record.
///
/// The recorded-check runs before anything touches the engine, so an
/// already-ingested capture never costs a recognition call.
async fn process_one<S, R>(
  store: &S,
  engine: &R,
  path: &Path,
  id: &CaptureId,
) -> std::result::Result<Unit, UnitError>
where
  S: CaptureStore,
  R: Recognizer,
{
  let recorded = store
    .capture_recorded(id)
    .await
    .map_err(|e| UnitError::Store(Box::new(e)))?;
  if recorded {
    return Ok(Unit::AlreadyRecorded);
  }

  let text = engine
    .recognize(path)
    .await
    .map_err(|e| UnitError::Recognize(Box::new(e)))?;
  let alias = alias_from_text(&text);

  let player_id = store
    .resolve_alias(alias)
    .await
    .map_err(|e| UnitError::Store(Box::new(e)))?;
  store
    .record_capture(id, player_id)
    .await
    .map_err(|e| UnitError::Store(Box::new(e)))?;

  Ok(Unit::Recorded { alias: alias.to_owned(), player_id })
}
