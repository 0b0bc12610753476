//! Command-line front end for the tab synchronization core.
//!
//! # Responsibility
//! - Wire a SQLite local cache and the HTTP storage endpoint into one
//!   `SyncCoordinator`.
//! - Expose inspection and one-shot sync commands for a single storage key.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tabsync_core::{
    default_log_level, init_logging, AutoSaveSettings, HttpRemoteStore, LoadOutcome, LocalCache,
    RemoteStore, SaveOutcome, SqliteLocalCache, StorageKey, SyncCoordinator, WorkspaceSnapshot,
};

#[derive(Debug, Parser)]
#[command(name = "tabsync", version, about = "Synchronize production tabs with a storage server")]
struct Cli {
    /// SQLite file holding the local cache.
    #[arg(long, env = "TABSYNC_DB", default_value = "tabsync.db")]
    db: PathBuf,

    /// Base URL of the storage server.
    #[arg(long, env = "TABSYNC_SERVER", default_value = "http://localhost:8080")]
    server: String,

    /// Data version used to derive the storage key.
    #[arg(long, env = "TABSYNC_APP_VERSION", default_value = "1.0")]
    app_version: String,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "TABSYNC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[arg(long, env = "TABSYNC_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show what the local cache holds for the storage key.
    Status,
    /// Replace the local workspace with the server copy.
    Pull,
    /// Upload the locally cached workspace to the server.
    Push,
    /// Clear every tab and upload the resulting blank workspace.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    let key = StorageKey::for_version(&cli.app_version);
    let local = Arc::new(
        SqliteLocalCache::open(&cli.db)
            .with_context(|| format!("failed to open cache `{}`", cli.db.display()))?,
    );
    let remote = Arc::new(HttpRemoteStore::new(cli.server.clone()));

    match cli.command {
        Command::Status => status(&key, &local),
        Command::Pull => pull(SyncCoordinator::new(key, local, remote)).await,
        Command::Push => push(&key, local.as_ref(), remote.as_ref()).await,
        Command::Reset => reset(SyncCoordinator::new(key, local, remote)).await,
    }
}

fn status(key: &StorageKey, local: &SqliteLocalCache) -> Result<()> {
    let settings = AutoSaveSettings::load(local);
    println!("key={key}");
    println!("cached_keys={}", local.keys().join(","));
    match local.load(key.as_str()) {
        Some(raw) => {
            let snapshot =
                WorkspaceSnapshot::from_json(raw).context("cached workspace is malformed")?;
            println!("local_tabs={}", snapshot.len());
        }
        None => println!("local_tabs=none"),
    }
    println!(
        "auto_save={} delay_seconds={}",
        settings.enabled, settings.delay_seconds
    );
    Ok(())
}

async fn pull(coordinator: SyncCoordinator) -> Result<()> {
    match coordinator.load_from_server().await {
        LoadOutcome::Loaded { tabs } => println!("pulled tabs={tabs}"),
        LoadOutcome::NoData => println!("server has no data for {}", coordinator.storage_key()),
        LoadOutcome::Stale => println!("pull superseded"),
        LoadOutcome::Failed(err) => {
            return Err(err).context("failed to load from server");
        }
    }
    Ok(())
}

async fn push(key: &StorageKey, local: &dyn LocalCache, remote: &dyn RemoteStore) -> Result<()> {
    let raw = local
        .load(key.as_str())
        .with_context(|| format!("local cache has no workspace under `{key}`"))?;
    let snapshot = WorkspaceSnapshot::from_json(raw).context("cached workspace is malformed")?;
    remote
        .put(key.as_str(), &snapshot.to_json())
        .await
        .context("failed to save to server")?;
    println!("pushed tabs={}", snapshot.len());
    Ok(())
}

async fn reset(coordinator: SyncCoordinator) -> Result<()> {
    coordinator.clear_all_tabs();
    coordinator.cancel_pending_save();
    match coordinator.save_to_server().await {
        SaveOutcome::Saved => {
            println!("reset tabs={}", coordinator.tab_ids().len());
            Ok(())
        }
        SaveOutcome::Skipped => anyhow::bail!("another save is already in flight"),
        SaveOutcome::Failed(err) => Err(err).context("failed to save to server"),
    }
}
