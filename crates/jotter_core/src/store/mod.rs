//! Observable client-side state containers.
//!
//! # Responsibility
//! - Mirror each remote call as `pending -> fulfilled | rejected` state.
//! - Publish snapshots to views through `tokio::sync::watch` channels.
//!
//! # Invariants
//! - Store operations never panic and never leak transport errors; every
//!   failure is reduced to one human-readable `error` string.
//! - Views never mutate store state directly.

use crate::model::token::BearerToken;
use thiserror::Error;

pub mod notes;
pub mod session;

/// Message used when a note operation runs without a session token.
pub const NOT_SIGNED_IN: &str = "Not signed in";

/// User-facing failure of one store operation.
///
/// The same message is recorded in the owning store's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the current session credential.
///
/// The notes store receives one of these instead of reading durable
/// storage on its own.
pub trait TokenSource: Send + Sync {
    fn current_token(&self) -> Option<BearerToken>;
}
