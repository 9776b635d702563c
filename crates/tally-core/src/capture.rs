//! Capture identity, the timestamp token derived from a capture's filename.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

/// The identifier of a single recorded sighting event.
///
/// Derived from a capture's file name by stripping the extension. The
/// producing watcher names files with sortable timestamp tokens, but nothing
/// here enforces ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureId(String);

impl CaptureId {
  /// Derive an id from a file name, e.g. `"1700000000.png"` becomes
  /// `"1700000000"`. A name with no extension maps to itself.
  pub fn from_file_name(name: &str) -> Self {
    let stem = Path::new(name)
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| name.to_owned());
    Self(stem)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CaptureId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
