//! [`SqliteStore`], the SQLite implementation of [`CaptureStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use tally_core::{
  capture::CaptureId,
  store::{CaptureStore, TallyRow},
};

use crate::{Error, Result, migrations};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A capture tracker store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and all
/// statements execute serially on its dedicated thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  ///
  /// A migration failure here is fatal: the store is left at its last good
  /// version and no handle is returned.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        migrations::apply(conn, migrations::MIGRATIONS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Raw row count of a table, for assertions in tests.
  pub(crate) async fn table_count(&self, table: &'static str) -> Result<i64> {
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(count)
  }
}

// ─── CaptureStore impl ───────────────────────────────────────────────────────

impl CaptureStore for SqliteStore {
  type Error = Error;

  async fn resolve_alias(&self, alias: &str) -> Result<i64> {
    let alias = alias.to_owned();
    let player_id = self
      .conn
      .call(move |conn| {
        // Lookup and insert run back to back on the connection's thread, so
        // two resolutions of the same alias cannot interleave here. The
        // orchestrator's one-at-a-time discipline is still what keeps the
        // wider pipeline race-free.
        let existing: Option<i64> = conn
          .query_row(
            "SELECT player_id FROM aliases WHERE name = ?1",
            rusqlite::params![alias],
            |r| r.get(0),
          )
          .optional()?;

        if let Some(player_id) = existing {
          return Ok(player_id);
        }

        conn.execute(
          "INSERT INTO players (name) VALUES (?1)",
          rusqlite::params![alias],
        )?;
        let player_id = conn.last_insert_rowid();
        conn.execute(
          "INSERT INTO aliases (player_id, name) VALUES (?1, ?2)",
          rusqlite::params![player_id, alias],
        )?;
        Ok(player_id)
      })
      .await?;
    Ok(player_id)
  }

  async fn capture_recorded(&self, id: &CaptureId) -> Result<bool> {
    let id = id.as_str().to_owned();
    let recorded = self
      .conn
      .call(move |conn| {
        let row: Option<i64> = conn
          .query_row(
            "SELECT 1 FROM captures WHERE id = ?1",
            rusqlite::params![id],
            |r| r.get(0),
          )
          .optional()?;
        Ok(row.is_some())
      })
      .await?;
    Ok(recorded)
  }

  async fn record_capture(&self, id: &CaptureId, player_id: i64) -> Result<()> {
    let id = id.as_str().to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO captures (id, player_id) VALUES (?1, ?2)",
          rusqlite::params![id, player_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn leaderboard(&self) -> Result<Vec<TallyRow>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT p.id, p.name, COUNT(c.id), MAX(c.id)
           FROM captures c
           INNER JOIN players p ON p.id = c.player_id
           GROUP BY p.id, p.name
           ORDER BY p.name ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(TallyRow {
              player_id: row.get(0)?,
              name:      row.get(1)?,
              captures:  row.get(2)?,
              latest:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}
