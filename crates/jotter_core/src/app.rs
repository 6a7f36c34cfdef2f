//! Application context wiring both stores together.
//!
//! # Responsibility
//! - Build one session store and one notes store per running program.
//! - Hand the notes store an explicit token accessor backed by the session.
//!
//! # Invariants
//! - Both stores share one API client and one token slot.
//! - `sign_out` leaves both stores empty.

use crate::api::{AuthApi, HttpApiClient, NotesApi};
use crate::config::{ClientConfig, ConfigError, RefreshPolicy};
use crate::storage::{SqliteTokenStore, StorageError, TokenStore};
use crate::store::notes::NotesStore;
use crate::store::session::SessionStore;
use crate::store::TokenSource;
use log::info;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("token storage unavailable: {0}")]
    Storage(#[from] StorageError),
}

/// The single state owner handed to views.
pub struct JotterApp<A = HttpApiClient>
where
    A: AuthApi + NotesApi + Clone + 'static,
{
    api: A,
    session: Arc<SessionStore<A>>,
    notes: NotesStore<A>,
}

impl JotterApp<HttpApiClient> {
    /// Builds the HTTP client and opens the durable token slot.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        let api = HttpApiClient::new(config)?;
        let slot = SqliteTokenStore::open(config.token_db_path())?;
        info!(
            "event=app_init module=app status=ok api_base_url={} refresh_policy={:?}",
            config.api_base_url(),
            config.refresh_policy()
        );
        Ok(Self::new(api, Arc::new(slot), config.refresh_policy()))
    }
}

impl<A> JotterApp<A>
where
    A: AuthApi + NotesApi + Clone + 'static,
{
    pub fn new(api: A, slot: Arc<dyn TokenStore>, policy: RefreshPolicy) -> Self {
        let session = Arc::new(SessionStore::new(api.clone(), slot));
        let token_source: Arc<dyn TokenSource> = session.clone();
        let notes = NotesStore::with_policy(api.clone(), token_source, policy);
        Self {
            api,
            session,
            notes,
        }
    }

    /// Shared API client, for calls outside the stores (health probes).
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &SessionStore<A> {
        &self.session
    }

    pub fn notes(&self) -> &NotesStore<A> {
        &self.notes
    }

    /// Ends the session and drops the cached notes.
    pub fn sign_out(&self) {
        self.session.sign_out();
        self.notes.reset();
    }
}
