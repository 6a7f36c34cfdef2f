//! Client-side data model mirrored from the notes API.
//!
//! # Responsibility
//! - Define the records exchanged with the remote API.
//! - Keep wire field names (`note_id`, `user_email`, ...) out of the rest of
//!   the crate via serde renames.
//!
//! # Invariants
//! - Every note and user is identified by a server-issued opaque string ID.
//! - A `BearerToken` is never empty.

pub mod note;
pub mod token;
pub mod user;
