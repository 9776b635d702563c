//! Tests for the normalizer and orchestrator, using tempdir fixtures, an
//! in-memory SQLite store, and a scripted recognition engine.

use std::{
  collections::HashMap,
  path::Path,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use tally_core::{
  capture::CaptureId,
  recognize::Recognizer,
  store::CaptureStore,
};
use tally_store_sqlite::SqliteStore;
use tempfile::tempdir;

use crate::{ingest, normalize};

// ─── Scripted engine ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("no scripted text for {0}")]
struct ScriptError(String);

/// A [`Recognizer`] that replays canned text per file name and counts its
/// recognitions and shutdowns.
struct ScriptedEngine {
  script:    HashMap<String, String>,
  calls:     Arc<Mutex<Vec<String>>>,
  shutdowns: Arc<AtomicUsize>,
}

impl ScriptedEngine {
  fn new(script: &[(&str, &str)]) -> (Self, Arc<Mutex<Vec<String>>>, Arc<AtomicUsize>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let shutdowns = Arc::new(AtomicUsize::new(0));
    let engine = Self {
      script: script
        .iter()
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .collect(),
      calls: Arc::clone(&calls),
      shutdowns: Arc::clone(&shutdowns),
    };
    (engine, calls, shutdowns)
  }
}

impl Recognizer for ScriptedEngine {
  type Error = ScriptError;

  async fn recognize(&self, path: &Path) -> Result<String, ScriptError> {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    self.calls.lock().unwrap().push(name.clone());
    self
      .script
      .get(&name)
      .cloned()
      .ok_or(ScriptError(name))
  }

  async fn shutdown(self) {
    self.shutdowns.fetch_add(1, Ordering::SeqCst);
  }
}

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn touch(dir: &Path, name: &str) {
  std::fs::write(dir.join(name), b"not a real image").unwrap();
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_captures_of_one_alias_record_one_player() {
  let dir = tempdir().unwrap();
  touch(dir.path(), "100.png");
  touch(dir.path(), "101.png");

  let s = store().await;
  let (engine, calls, shutdowns) = ScriptedEngine::new(&[
    ("100.png", "Heart\nAlice\n99+ hearts"),
    ("101.png", "Heart\nAlice\n99+ hearts"),
  ]);

  let report = ingest(&s, engine, dir.path()).await.unwrap();
  assert_eq!(report.recorded, 2);
  assert_eq!(report.skipped, 0);
  assert_eq!(report.failed, 0);
  assert_eq!(calls.lock().unwrap().len(), 2);
  assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

  let rows = s.leaderboard().await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].name, "Alice");
  assert_eq!(rows[0].captures, 2);
  assert_eq!(rows[0].latest, "101");
}

#[tokio::test]
async fn recorded_captures_are_skipped_without_a_recognition_call() {
  let dir = tempdir().unwrap();
  touch(dir.path(), "100.png");

  let s = store().await;
  let player_id = s.resolve_alias("Alice").await.unwrap();
  s.record_capture(&CaptureId::from_file_name("100.png"), player_id)
    .await
    .unwrap();

  // Unscripted: any recognition call would fail the unit.
  let (engine, calls, shutdowns) = ScriptedEngine::new(&[]);

  let report = ingest(&s, engine, dir.path()).await.unwrap();
  assert_eq!(report.recorded, 0);
  assert_eq!(report.skipped, 1);
  assert_eq!(report.failed, 0);
  assert!(calls.lock().unwrap().is_empty());
  assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rerunning_ingestion_is_a_no_op() {
  let dir = tempdir().unwrap();
  touch(dir.path(), "100.png");

  let s = store().await;
  let (engine, _, _) = ScriptedEngine::new(&[("100.png", "Heart\nAlice\n")]);
  ingest(&s, engine, dir.path()).await.unwrap();

  let (engine, calls, _) = ScriptedEngine::new(&[]);
  let report = ingest(&s, engine, dir.path()).await.unwrap();
  assert_eq!(report.recorded, 0);
  assert_eq!(report.skipped, 1);
  assert!(calls.lock().unwrap().is_empty());

  let rows = s.leaderboard().await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].captures, 1);
}

#[tokio::test]
async fn one_failing_unit_does_not_block_the_rest() {
  let dir = tempdir().unwrap();
  touch(dir.path(), "100.png");
  touch(dir.path(), "101.png");

  let s = store().await;
  // 100.png is unscripted, so its recognition fails.
  let (engine, _, shutdowns) = ScriptedEngine::new(&[("101.png", "Heart\nBob\n")]);

  let report = ingest(&s, engine, dir.path()).await.unwrap();
  assert_eq!(report.recorded, 1);
  assert_eq!(report.failed, 1);
  assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

  let rows = s.leaderboard().await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].name, "Bob");
  assert_eq!(rows[0].latest, "101");
}

#[tokio::test]
async fn engine_is_released_with_zero_candidates() {
  let dir = tempdir().unwrap();

  let s = store().await;
  let (engine, calls, shutdowns) = ScriptedEngine::new(&[]);

  let report = ingest(&s, engine, dir.path()).await.unwrap();
  assert_eq!(report, crate::IngestReport::default());
  assert!(calls.lock().unwrap().is_empty());
  assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn engine_is_released_even_when_listing_fails() {
  let dir = tempdir().unwrap();
  let missing = dir.path().join("not-there");

  let s = store().await;
  let (engine, _, shutdowns) = ScriptedEngine::new(&[]);

  ingest(&s, engine, &missing).await.unwrap_err();
  assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn degenerate_text_resolves_the_empty_alias() {
  let dir = tempdir().unwrap();
  touch(dir.path(), "100.png");

  let s = store().await;
  let (engine, _, _) = ScriptedEngine::new(&[("100.png", "just one line")]);

  let report = ingest(&s, engine, dir.path()).await.unwrap();
  assert_eq!(report.recorded, 1);

  let rows = s.leaderboard().await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].name, "");
}

// ─── Engine discovery ────────────────────────────────────────────────────────

#[test]
fn missing_override_executable_is_not_found() {
  let err = crate::tesseract::TesseractEngine::discover(
    Some(Path::new("/no/such/tesseract")),
    "eng",
  )
  .unwrap_err();
  assert!(matches!(err, crate::tesseract::EngineError::NotFound));
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn resizes_to_the_target_width() {
  let dir = tempdir().unwrap();
  let source = dir.path().join("raw");
  let normalized = dir.path().join("normalized");
  std::fs::create_dir_all(&source).unwrap();
  image::RgbaImage::new(8, 4).save(source.join("100.png")).unwrap();

  let report = normalize(&source, &normalized, 4).await.unwrap();
  assert_eq!(report.resized, 1);
  assert_eq!(report.failed, 0);

  let out = image::open(normalized.join("100.png")).unwrap();
  assert_eq!(out.width(), 4);
  assert_eq!(out.height(), 2);
}

#[tokio::test]
async fn already_normalized_files_are_skipped() {
  let dir = tempdir().unwrap();
  let source = dir.path().join("raw");
  let normalized = dir.path().join("normalized");
  std::fs::create_dir_all(&source).unwrap();
  image::RgbaImage::new(8, 4).save(source.join("100.png")).unwrap();

  let first = normalize(&source, &normalized, 4).await.unwrap();
  assert_eq!(first.resized, 1);

  let second = normalize(&source, &normalized, 4).await.unwrap();
  assert_eq!(second.resized, 0);
  assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn missing_source_dir_is_a_silent_skip() {
  let dir = tempdir().unwrap();
  let source = dir.path().join("raw");
  let normalized = dir.path().join("normalized");

  let report = normalize(&source, &normalized, 4).await.unwrap();
  assert_eq!(report, crate::NormalizeReport::default());

  // The normalized directory still exists for the ingestion stage.
  assert!(normalized.is_dir());
}

#[tokio::test]
async fn one_bad_file_does_not_abort_its_siblings() {
  let dir = tempdir().unwrap();
  let source = dir.path().join("raw");
  let normalized = dir.path().join("normalized");
  std::fs::create_dir_all(&source).unwrap();
  image::RgbaImage::new(8, 4).save(source.join("good.png")).unwrap();
  std::fs::write(source.join("bad.png"), b"definitely not a png").unwrap();

  let report = normalize(&source, &normalized, 4).await.unwrap();
  assert_eq!(report.resized, 1);
  assert_eq!(report.failed, 1);
  assert!(normalized.join("good.png").exists());
  assert!(!normalized.join("bad.png").exists());
}
