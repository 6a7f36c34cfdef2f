//! Connection bootstrap for the token slot database.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{StorageError, StorageResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (or creates) a slot database file and applies pending migrations.
///
/// Missing parent directories are created.
pub fn open_db(path: impl AsRef<Path>) -> StorageResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            // rusqlite reports a missing directory as a generic open failure.
            if let Err(err) = std::fs::create_dir_all(parent) {
                error!(
                    "event=db_open module=storage status=error mode=file error_code=mkdir_failed error={}",
                    err
                );
            }
        }
    }
    bootstrap("file", || Connection::open(path))
}

/// Opens a private in-memory slot database.
pub fn open_db_in_memory() -> StorageResult<Connection> {
    bootstrap("memory", Connection::open_in_memory)
}

fn bootstrap(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> StorageResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=storage status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=storage status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let configured = conn
        .busy_timeout(Duration::from_secs(5))
        .map_err(StorageError::from)
        .and_then(|()| apply_migrations(&mut conn));
    match configured {
        Ok(()) => {
            info!(
                "event=db_open module=storage status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=storage status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
