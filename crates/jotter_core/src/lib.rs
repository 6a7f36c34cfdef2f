//! Client core for the jotter notes service.
//!
//! Owns session and notes state for one running program and keeps it in
//! sync with the remote notes API. Views render store snapshots and call
//! store operations; they hold no business state themselves.

pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;

pub use api::{ApiError, ApiResult, AuthApi, HttpApiClient, NotesApi};
pub use app::{AppError, JotterApp};
pub use config::{ClientConfig, ConfigError, RefreshPolicy};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteDraft, NoteId};
pub use model::token::{BearerToken, TokenError};
pub use model::user::{UserId, UserProfile};
pub use storage::{MemoryTokenStore, SqliteTokenStore, StorageError, TokenStore};
pub use store::notes::{NotesState, NotesStore};
pub use store::session::{SessionState, SessionStore};
pub use store::{StoreError, StoreResult, TokenSource};
