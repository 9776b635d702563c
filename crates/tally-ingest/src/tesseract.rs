//! [`TesseractEngine`], a [`Recognizer`] backed by the external `tesseract`
//! executable.

use std::{
  path::{Path, PathBuf},
  process::Stdio,
};

use tally_core::recognize::Recognizer;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Well-known install locations, checked after `PATH`.
const COMMON_PATHS: &[&str] = &[
  "/usr/bin/tesseract",
  "/usr/local/bin/tesseract",
  "/opt/homebrew/bin/tesseract",
];

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("failed to run tesseract: {0}")]
  Io(#[from] std::io::Error),

  #[error("tesseract exited with {status}: {stderr}")]
  Tesseract {
    status: std::process::ExitStatus,
    stderr: String,
  },

  #[error("tesseract executable not found; install tesseract-ocr or set its path in the config")]
  NotFound,
}

/// Text recognition via a `tesseract` subprocess.
///
/// One recognition runs at a time by contract; the orchestrator's serialized
/// loop upholds that.
#[derive(Debug)]
pub struct TesseractEngine {
  executable: PathBuf,
  tessdata:   Option<PathBuf>,
  lang:       String,
}

impl TesseractEngine {
  /// Build an engine around a known executable.
  pub fn new(executable: PathBuf, tessdata: Option<PathBuf>, lang: impl Into<String>) -> Self {
    Self { executable, tessdata, lang: lang.into() }
  }

  /// Locate a usable tesseract executable: an explicit override first, then
  /// `PATH`, then well-known install locations.
  pub fn discover(override_path: Option<&Path>, lang: &str) -> Result<Self, EngineError> {
    if let Some(path) = override_path {
      if path.exists() {
        return Ok(Self::new(path.to_path_buf(), None, lang));
      }
      return Err(EngineError::NotFound);
    }

    if let Ok(output) = std::process::Command::new("tesseract")
      .arg("--version")
      .output()
    {
      if output.status.success() {
        return Ok(Self::new(PathBuf::from("tesseract"), None, lang));
      }
    }

    for candidate in COMMON_PATHS {
      let path = Path::new(candidate);
      if path.exists() {
        return Ok(Self::new(path.to_path_buf(), None, lang));
      }
    }

    Err(EngineError::NotFound)
  }
}

impl Recognizer for TesseractEngine {
  type Error = EngineError;

  async fn recognize(&self, path: &Path) -> Result<String, EngineError> {
    let mut command = Command::new(&self.executable);
    command
      .arg(path)
      .arg("stdout")
      .args(["-l", &self.lang, "--psm", "6"])
      .stdin(Stdio::null());
    if let Some(tessdata) = &self.tessdata {
      command.arg("--tessdata-dir").arg(tessdata);
    }

    let output = command.output().await?;
    if !output.status.success() {
      return Err(EngineError::Tesseract {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }

  async fn shutdown(self) {
    debug!("recognition engine released");
  }
}
