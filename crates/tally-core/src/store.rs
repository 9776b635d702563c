//! The [`CaptureStore`] trait and the leaderboard read model.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! The pipeline depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureId;

/// One leaderboard row: a player and their capture tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyRow {
  pub player_id: i64,
  pub name:      String,
  /// Number of captures attributed to the player.
  pub captures:  i64,
  /// Highest capture id attributed to the player; ids are timestamp tokens,
  /// so this is the most recent sighting under the producer's naming scheme.
  pub latest:    String,
}

/// Abstraction over the capture tracker's persistent store.
///
/// Player and alias rows are created lazily by [`resolve_alias`] on first
/// sighting of a new alias, and are never updated or deleted by the
/// pipeline. Capture rows are recorded at most once per id.
///
/// [`resolve_alias`] is a find-or-create over the alias string. A backend
/// makes it atomic with respect to a single store handle, but the
/// check-then-act shape still relies on the orchestrator keeping at most one
/// resolution in flight at a time; that serialization is a load-bearing
/// invariant, not an optimisation.
///
/// [`resolve_alias`]: CaptureStore::resolve_alias
pub trait CaptureStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Map an alias string to its player id, creating the player (named after
  /// the alias) and the alias row on first sighting. The empty alias is a
  /// valid, if degenerate, key.
  fn resolve_alias<'a>(
    &'a self,
    alias: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Whether a capture id has already been recorded.
  fn capture_recorded<'a>(
    &'a self,
    id: &'a CaptureId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Record a capture attributed to `player_id`. Backends enforce at most
  /// one row per id.
  fn record_capture<'a>(
    &'a self,
    id: &'a CaptureId,
    player_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Per-player capture tallies, ordered by player name.
  fn leaderboard(
    &self,
  ) -> impl Future<Output = Result<Vec<TallyRow>, Self::Error>> + Send + '_;
}
