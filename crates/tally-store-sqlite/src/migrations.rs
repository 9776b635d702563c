//! Versioned, forward-only schema migrations.
//!
//! Applied versions are tracked in a `migrations` table. A version's row is
//! inserted in the same transaction as its DDL, so a version is never marked
//! applied unless the statement actually ran. Nothing is ever re-applied,
//! rolled back, or reordered.

use rusqlite::Connection;

/// A single schema change, keyed by a monotonically increasing version.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
  pub version: i64,
  pub ddl:     &'static str,
}

/// The tracker schema.
pub const MIGRATIONS: &[Migration] = &[
  Migration {
    version: 1,
    ddl:     "CREATE TABLE players (
                id   INTEGER PRIMARY KEY,
                name TEXT NOT NULL
              );",
  },
  Migration {
    version: 2,
    ddl:     "CREATE TABLE aliases (
                id        INTEGER PRIMARY KEY,
                player_id INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE,
                name      TEXT NOT NULL
              );",
  },
  Migration {
    version: 3,
    ddl:     "CREATE TABLE captures (
                id        TEXT PRIMARY KEY,
                player_id INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE
              );",
  },
];

/// Apply every migration in `pending` whose version exceeds the highest
/// already-applied one, in ascending version order regardless of input
/// order. Returns the number of migrations applied.
///
/// Versions are compared numerically; gaps in the sequence are fine. A DDL
/// failure aborts immediately: the failing version is not recorded, later
/// versions are not attempted, and everything applied before it stays
/// applied.
pub fn apply(conn: &mut Connection, pending: &[Migration]) -> rusqlite::Result<u32> {
  conn.execute(
    "CREATE TABLE IF NOT EXISTS migrations (id INTEGER PRIMARY KEY)",
    [],
  )?;

  let max_applied: i64 =
    conn.query_row("SELECT COALESCE(MAX(id), 0) FROM migrations", [], |r| r.get(0))?;

  let mut ordered: Vec<&Migration> = pending.iter().collect();
  ordered.sort_by_key(|m| m.version);

  let mut applied = 0;
  for migration in ordered {
    if migration.version <= max_applied {
      continue;
    }

    tracing::info!(version = migration.version, "applying migration");
    let tx = conn.transaction()?;
    tx.execute_batch(migration.ddl)?;
    tx.execute(
      "INSERT INTO migrations (id) VALUES (?1)",
      [migration.version],
    )?;
    tx.commit()?;
    applied += 1;
  }

  Ok(applied)
}
