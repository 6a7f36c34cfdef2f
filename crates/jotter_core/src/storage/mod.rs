//! Durable token slot and its SQLite bootstrap.
//!
//! # Responsibility
//! - Persist exactly one bearer token across process restarts.
//! - Open and migrate the backing SQLite file before first use.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A blank persisted value is reported as "no token", never as an error.
//! - The slot is only written by the session store.

use crate::model::token::BearerToken;
use thiserror::Error;

mod memory;
pub mod migrations;
mod open;
mod sqlite;

pub use memory::MemoryTokenStore;
pub use open::{open_db, open_db_in_memory};
pub use sqlite::{SqliteTokenStore, TOKEN_SLOT_KEY};

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error(
        "database schema version {db_version} is newer than supported {latest_supported}"
    )]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("token slot lock poisoned")]
    Poisoned,
}

/// Single string-keyed slot holding the session bearer token.
pub trait TokenStore: Send + Sync {
    /// Reads the persisted token, if any.
    fn load(&self) -> StorageResult<Option<BearerToken>>;
    /// Replaces the persisted token.
    fn save(&self, token: &BearerToken) -> StorageResult<()>;
    /// Removes the persisted token. Clearing an empty slot is a no-op.
    fn clear(&self) -> StorageResult<()>;
}
