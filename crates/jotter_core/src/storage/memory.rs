//! Process-local token slot.

use super::{StorageError, StorageResult, TokenStore};
use crate::model::token::BearerToken;
use std::sync::Mutex;

/// Token slot that lives only as long as the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<BearerToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot pre-seeded with `token`.
    pub fn with_token(token: BearerToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> StorageResult<Option<BearerToken>> {
        Ok(self.slot.lock().map_err(|_| StorageError::Poisoned)?.clone())
    }

    fn save(&self, token: &BearerToken) -> StorageResult<()> {
        *self.slot.lock().map_err(|_| StorageError::Poisoned)? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.slot.lock().map_err(|_| StorageError::Poisoned)? = None;
        Ok(())
    }
}
