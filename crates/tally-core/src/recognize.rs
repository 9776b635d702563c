//! The [`Recognizer`] seam over the black-box text-recognition engine.

use std::{future::Future, path::Path};

/// Abstraction over a text-recognition engine.
///
/// The engine is a process-wide singleton that cannot service concurrent
/// recognitions. Callers must keep at most one `recognize` in flight at a
/// time, and must consume the engine with [`Recognizer::shutdown`] after the
/// last recognition has settled. Taking `self` by value there makes a second
/// release unrepresentable.
pub trait Recognizer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Recognize the text in the image at `path`, returning the engine's raw
  /// multi-line output.
  fn recognize<'a>(
    &'a self,
    path: &'a Path,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Release the engine. Infallible; failures during teardown are the
  /// implementation's to log.
  fn shutdown(self) -> impl Future<Output = ()> + Send;
}

/// Extract the player alias from recognized text.
///
/// The alias is the second line of the engine's output. Degenerate output
/// (a single line, or none) yields the empty alias, which downstream still
/// treats as a valid lookup key.
pub fn alias_from_text(text: &str) -> &str {
  text.lines().nth(1).unwrap_or("")
}
