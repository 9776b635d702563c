//! `tally`: run-once driver for the capture ingestion pipeline.
//!
//! Reads `tally.toml` (or the path given with `--config`), brings the
//! SQLite store's schema up to date, normalizes newly deposited captures,
//! and ingests them: recognize, resolve identity, record. `tally board`
//! prints the per-player capture tallies instead.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tally_core::store::CaptureStore as _;
use tally_ingest::TesseractEngine;
use tally_store_sqlite::SqliteStore;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tally", about = "Screen-capture player tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Normalize and ingest pending captures (the default).
  Run,
  /// Print per-player capture tallies.
  Board,
}

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct TallyConfig {
  /// SQLite database path.
  db_path: PathBuf,
  /// Directory the external watcher deposits raw captures into.
  source_dir: PathBuf,
  /// Parent data directory; normalized captures land in
  /// `<data_dir>/normalized`.
  data_dir: PathBuf,
  /// Width captures are scaled to before recognition.
  target_width: u32,
  /// Explicit tesseract executable, overriding discovery.
  tesseract: Option<PathBuf>,
  /// Recognition language passed to tesseract.
  lang: String,
}

impl Default for TallyConfig {
  fn default() -> Self {
    Self {
      db_path:      PathBuf::from("tally.db"),
      source_dir:   PathBuf::from(".tracker"),
      data_dir:     PathBuf::from("data"),
      target_width: 320,
      tesseract:    None,
      lang:         "eng".to_string(),
    }
  }
}

impl TallyConfig {
  fn normalized_dir(&self) -> PathBuf {
    self.data_dir.join("normalized")
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("TALLY"))
    .build()
    .context("failed to read configuration")?;
  let cfg: TallyConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  // Opening the store applies pending migrations; a failed migration is
  // fatal and nothing below runs.
  let store = SqliteStore::open(&cfg.db_path)
    .await
    .with_context(|| format!("failed to open store at {}", cfg.db_path.display()))?;

  match cli.command.unwrap_or(Command::Run) {
    Command::Run => run_pipeline(&store, &cfg).await,
    Command::Board => print_board(&store).await,
  }
}

async fn run_pipeline(store: &SqliteStore, cfg: &TallyConfig) -> anyhow::Result<()> {
  let normalized_dir = cfg.normalized_dir();

  tally_ingest::normalize(&cfg.source_dir, &normalized_dir, cfg.target_width)
    .await
    .context("normalization step failed")?;

  let engine = TesseractEngine::discover(cfg.tesseract.as_deref(), &cfg.lang)
    .context("no usable recognition engine")?;

  let report = tally_ingest::ingest(store, engine, &normalized_dir)
    .await
    .context("ingestion step failed")?;

  info!(
    recorded = report.recorded,
    skipped = report.skipped,
    failed = report.failed,
    "run complete"
  );
  Ok(())
}

async fn print_board(store: &SqliteStore) -> anyhow::Result<()> {
  let rows = store
    .leaderboard()
    .await
    .context("failed to read leaderboard")?;

  if rows.is_empty() {
    println!("no captures recorded yet");
    return Ok(());
  }

  for row in rows {
    println!(
      "{:>5}  {:<24}  {:>6}  {}",
      row.player_id, row.name, row.captures, row.latest
    );
  }
  Ok(())
}
