//! Notes store: the in-memory note collection for the current session.
//!
//! # Responsibility
//! - Fetch, create, update and delete notes through `NotesApi`.
//! - Track which note a transient edit view is working on.
//!
//! # Invariants
//! - A successful fetch replaces `notes` wholesale, in server order.
//! - A successful delete of `X` leaves no element with `id == X`; the other
//!   elements keep their order.
//! - Under `RefreshPolicy::Manual`, create/update never touch `notes`.
//! - A fetch response is applied only if no newer fetch or delete started
//!   after it was issued.
//! - Nothing issued before a `reset()` writes into the state after it.
//! - `is_loading` stays true while any operation is in flight.

use super::{StoreError, StoreResult, TokenSource, NOT_SIGNED_IN};
use crate::api::{ApiError, NotesApi};
use crate::config::RefreshPolicy;
use crate::model::note::{Note, NoteDraft, NoteId};
use crate::model::token::BearerToken;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

pub const FETCH_FAILED: &str = "Failed to fetch notes";
pub const CREATE_FAILED: &str = "Failed to create note";
pub const UPDATE_FAILED: &str = "Failed to update note";
pub const DELETE_FAILED: &str = "Failed to delete note";
pub const LOAD_FAILED: &str = "Failed to load note";
pub const NOTE_UNAVAILABLE: &str = "Note is no longer available";

/// Snapshot of notes state published to views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesState {
    pub notes: Vec<Note>,
    /// Note targeted by the open edit view, if any.
    pub current_note: Option<Note>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Owner of the notes collection state.
pub struct NotesStore<A: NotesApi> {
    api: A,
    session: Arc<dyn TokenSource>,
    policy: RefreshPolicy,
    state: watch::Sender<NotesState>,
    // The counters are only touched inside `send_modify`, which serializes them.
    in_flight: AtomicUsize,
    fetch_generation: AtomicU64,
    reset_epoch: AtomicU64,
}

/// Counter values an operation was issued under, or the latest ones when
/// handed to a `settle` closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Issued {
    fetch: u64,
    epoch: u64,
}

impl<A: NotesApi> NotesStore<A> {
    pub fn new(api: A, session: Arc<dyn TokenSource>) -> Self {
        Self::with_policy(api, session, RefreshPolicy::default())
    }

    pub fn with_policy(api: A, session: Arc<dyn TokenSource>, policy: RefreshPolicy) -> Self {
        let (state, _) = watch::channel(NotesState::default());
        Self {
            api,
            session,
            policy,
            state,
            in_flight: AtomicUsize::new(0),
            fetch_generation: AtomicU64::new(0),
            reset_epoch: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> NotesState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotesState> {
        self.state.subscribe()
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Replaces `notes` with the server's current collection.
    pub async fn fetch_notes(&self) -> StoreResult<()> {
        let token = self.token("fetch_notes")?;
        let issued = self.begin("fetch_notes", true);

        match self.api.list_notes(&token).await {
            Ok(notes) => {
                let count = notes.len();
                let mut applied = false;
                self.settle(|state, latest| {
                    if latest.fetch == issued.fetch {
                        state.notes = notes;
                        applied = true;
                    }
                });
                if applied {
                    info!("event=fetch_notes module=notes status=ok count={count}");
                } else {
                    debug!(
                        "event=fetch_notes module=notes status=ok detail=superseded generation={}",
                        issued.fetch
                    );
                }
                Ok(())
            }
            Err(err) => {
                let mut superseded = false;
                let message = err.user_message(FETCH_FAILED);
                self.settle(|state, latest| {
                    if latest.fetch == issued.fetch {
                        state.error = Some(message.clone());
                    } else {
                        superseded = true;
                    }
                });
                log_failure("fetch_notes", &err, superseded);
                Err(StoreError::new(message))
            }
        }
    }

    /// Creates a note. `notes` is left alone unless the policy refetches.
    pub async fn create_note(&self, title: &str, content: &str) -> StoreResult<()> {
        let token = self.token("create_note")?;
        let issued = self.begin("create_note", false);
        let draft = NoteDraft::new(title, content);

        let result = self.api.create_note(&token, &draft).await;
        self.finish_write("create_note", issued, result, CREATE_FAILED, |_| {})?;
        self.refresh_after_write().await;
        Ok(())
    }

    /// Replaces title and content of note `id` on the server.
    pub async fn update_note(&self, id: &str, title: &str, content: &str) -> StoreResult<()> {
        let token = self.token("update_note")?;
        let issued = self.begin("update_note", false);
        let id: NoteId = id.to_string();
        let draft = NoteDraft::new(title, content);

        let result = self.api.update_note(&token, &id, &draft).await;
        self.finish_write("update_note", issued, result, UPDATE_FAILED, |_| {})?;
        self.refresh_after_write().await;
        Ok(())
    }

    /// Deletes note `id` and prunes it from `notes` on success.
    pub async fn delete_note(&self, id: &str) -> StoreResult<()> {
        let token = self.token("delete_note")?;
        let issued = self.begin("delete_note", false);
        let id: NoteId = id.to_string();

        let result = self.api.delete_note(&token, &id).await;
        self.finish_write("delete_note", issued, result, DELETE_FAILED, |state| {
            state.notes.retain(|note| note.id != id);
            // Fetches issued before the delete must not bring the note back.
            self.fetch_generation.fetch_add(1, Ordering::Relaxed);
            if state
                .current_note
                .as_ref()
                .is_some_and(|note| note.id == id)
            {
                state.current_note = None;
            }
        })?;
        self.refresh_after_write().await;
        Ok(())
    }

    /// Fetches one note and makes it `current_note`.
    ///
    /// A response that arrives after `reset()` is discarded and reported as
    /// `NOTE_UNAVAILABLE`.
    pub async fn load_note(&self, id: &str) -> StoreResult<Note> {
        let token = self.token("load_note")?;
        let issued = self.begin("load_note", false);
        let id: NoteId = id.to_string();

        match self.api.get_note(&token, &id).await {
            Ok(note) => {
                let mut applied = false;
                self.settle(|state, latest| {
                    if latest.epoch == issued.epoch {
                        state.current_note = Some(note.clone());
                        applied = true;
                    }
                });
                if !applied {
                    debug!("event=load_note module=notes status=ok detail=superseded");
                    return Err(StoreError::new(NOTE_UNAVAILABLE));
                }
                info!("event=load_note module=notes status=ok");
                Ok(note)
            }
            Err(err) => {
                let message = err.user_message(LOAD_FAILED);
                let mut superseded = false;
                self.settle(|state, latest| {
                    if latest.epoch == issued.epoch {
                        state.error = Some(message.clone());
                    } else {
                        superseded = true;
                    }
                });
                log_failure("load_note", &err, superseded);
                Err(StoreError::new(message))
            }
        }
    }

    pub fn set_current_note(&self, note: Option<Note>) {
        self.state.send_modify(|state| state.current_note = note);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    /// Empties the collection, e.g. after sign-out.
    ///
    /// Fetches still in flight are superseded and will not repopulate it.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.fetch_generation.fetch_add(1, Ordering::Relaxed);
            self.reset_epoch.fetch_add(1, Ordering::Relaxed);
            *state = NotesState {
                is_loading: self.in_flight.load(Ordering::Relaxed) > 0,
                ..NotesState::default()
            };
        });
        info!("event=reset module=notes status=ok");
    }

    fn token(&self, operation: &str) -> StoreResult<BearerToken> {
        match self.session.current_token() {
            Some(token) => Ok(token),
            None => {
                self.state
                    .send_modify(|state| state.error = Some(NOT_SIGNED_IN.to_string()));
                warn!("event={operation} module=notes status=error error_code=not_signed_in");
                Err(StoreError::new(NOT_SIGNED_IN))
            }
        }
    }

    /// Enters the pending state. The fetch generation is advanced first when
    /// `new_fetch` is set.
    fn begin(&self, operation: &str, new_fetch: bool) -> Issued {
        let mut issued = Issued { fetch: 0, epoch: 0 };
        self.state.send_modify(|state| {
            self.in_flight.fetch_add(1, Ordering::Relaxed);
            if new_fetch {
                self.fetch_generation.fetch_add(1, Ordering::Relaxed);
            }
            issued = self.latest();
            state.is_loading = true;
            state.error = None;
        });
        info!("event={operation} module=notes status=start");
        issued
    }

    /// Leaves the pending state, applying `apply` with the latest counters
    /// under the same lock.
    fn settle(&self, apply: impl FnOnce(&mut NotesState, Issued)) {
        self.state.send_modify(|state| {
            apply(state, self.latest());
            let remaining = self
                .in_flight
                .fetch_sub(1, Ordering::Relaxed)
                .saturating_sub(1);
            state.is_loading = remaining > 0;
        });
    }

    fn latest(&self) -> Issued {
        Issued {
            fetch: self.fetch_generation.load(Ordering::Relaxed),
            epoch: self.reset_epoch.load(Ordering::Relaxed),
        }
    }

    fn finish_write(
        &self,
        operation: &str,
        issued: Issued,
        result: Result<(), ApiError>,
        fallback: &str,
        on_success: impl FnOnce(&mut NotesState),
    ) -> StoreResult<()> {
        match result {
            Ok(()) => {
                self.settle(|state, _| on_success(state));
                info!("event={operation} module=notes status=ok");
                Ok(())
            }
            Err(err) => {
                let message = err.user_message(fallback);
                let mut superseded = false;
                self.settle(|state, latest| {
                    if latest.epoch == issued.epoch {
                        state.error = Some(message.clone());
                    } else {
                        superseded = true;
                    }
                });
                log_failure(operation, &err, superseded);
                Err(StoreError::new(message))
            }
        }
    }

    async fn refresh_after_write(&self) {
        if self.policy == RefreshPolicy::RefetchAfterWrite {
            // Failure is already recorded in `error` by the fetch itself.
            let _ = self.fetch_notes().await;
        }
    }
}

fn log_failure(operation: &str, err: &ApiError, superseded: bool) {
    warn!(
        "event={operation} module=notes status=error error_code={} superseded={superseded} error={err}",
        err.code()
    );
}
