//! Note record and write payloads.
//!
//! # Responsibility
//! - Decode server note rows into typed records.
//! - Carry title/content pairs for create and update requests.
//!
//! # Invariants
//! - `id` is stable for the lifetime of the note on the server.
//! - Timestamps are naive UTC values; the server never sends an offset.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server-issued note identifier.
pub type NoteId = String;

/// One note owned by the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "note_id")]
    pub id: NoteId,
    #[serde(rename = "note_title")]
    pub title: String,
    #[serde(rename = "note_content")]
    pub content: String,
    /// Creation time, UTC.
    #[serde(rename = "created_on")]
    pub created_at: NaiveDateTime,
    /// Last modification time, UTC.
    #[serde(rename = "last_update")]
    pub updated_at: NaiveDateTime,
}

/// Title/content pair sent on create and full update.
///
/// Both fields are expected to be non-empty. The stores pass them through
/// untouched and let the server reject blank values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    #[serde(rename = "note_title")]
    pub title: String,
    #[serde(rename = "note_content")]
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}
