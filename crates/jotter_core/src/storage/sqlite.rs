//! SQLite-backed token slot.

use super::{open_db, open_db_in_memory, StorageError, StorageResult, TokenStore};
use crate::model::token::BearerToken;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Slot key holding the session token.
pub const TOKEN_SLOT_KEY: &str = "auth_token";

/// Token slot persisted in the `kv_slots` table.
pub struct SqliteTokenStore {
    conn: Mutex<Connection>,
}

impl SqliteTokenStore {
    /// Opens the slot database at `path`, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a throwaway in-memory slot.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl TokenStore for SqliteTokenStore {
    fn load(&self) -> StorageResult<Option<BearerToken>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                [TOKEN_SLOT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match raw.map(BearerToken::new) {
            Some(Ok(token)) => Ok(Some(token)),
            Some(Err(_)) => {
                warn!("event=token_load module=storage status=ok detail=blank_slot_ignored");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn save(&self, token: &BearerToken) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![TOKEN_SLOT_KEY, token.as_str()],
        )?;
        debug!("event=token_save module=storage status=ok");
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM kv_slots WHERE key = ?1;", [TOKEN_SLOT_KEY])?;
        debug!("event=token_clear module=storage status=ok removed={removed}");
        Ok(())
    }
}
