//! Capture normalization: width-bounded resize of raw captures into the
//! directory the recognition stage reads from.

use std::path::Path;

use image::imageops::FilterType;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::Result;

/// Outcome counts for one normalization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeReport {
  pub resized: usize,
  pub skipped: usize,
  pub failed:  usize,
}

/// Resize every capture in `source_dir` not yet present in `normalized_dir`,
/// writing each result under the same file name.
///
/// The normalized directory (and its parents) is created up front, so later
/// stages can rely on it existing even when there is nothing to do. All
/// resizes run concurrently and the pass completes once every one has
/// settled; a single file's failure is logged and never aborts its siblings.
/// A missing `source_dir` means the watcher has not produced anything yet
/// and is not an error.
pub async fn normalize(
  source_dir: &Path,
  normalized_dir: &Path,
  target_width: u32,
) -> Result<NormalizeReport> {
  let mut report = NormalizeReport::default();

  tokio::fs::create_dir_all(normalized_dir).await?;

  if !source_dir.exists() {
    info!(source = %source_dir.display(), "source directory absent, nothing to normalize");
    return Ok(report);
  }

  let mut tasks: JoinSet<(String, image::ImageResult<()>)> = JoinSet::new();

  let mut entries = tokio::fs::read_dir(source_dir).await?;
  while let Some(entry) = entries.next_entry().await? {
    let name = entry.file_name().to_string_lossy().into_owned();
    let destination = normalized_dir.join(&name);
    if destination.exists() {
      report.skipped += 1;
      continue;
    }
    let source = entry.path();
    tasks.spawn_blocking(move || {
      let outcome = resize_to_width(&source, &destination, target_width);
      (name, outcome)
    });
  }

  while let Some(settled) = tasks.join_next().await {
    let (name, outcome) = settled?;
    match outcome {
      Ok(()) => report.resized += 1,
      Err(error) => {
        warn!(file = %name, %error, "failed to normalize capture");
        report.failed += 1;
      }
    }
  }

  info!(
    resized = report.resized,
    skipped = report.skipped,
    failed = report.failed,
    "normalization pass complete"
  );

  Ok(report)
}

/// Scale the image at `source` to `target_width`, preserving aspect ratio,
/// and write it to `destination`.
fn resize_to_width(
  source: &Path,
  destination: &Path,
  target_width: u32,
) -> image::ImageResult<()> {
  let img = image::open(source)?;
  let scaled = img.resize(target_width, u32::MAX, FilterType::Lanczos3);
  scaled.save(destination)
}
