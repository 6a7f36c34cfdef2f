//! Session store: authenticated identity and bearer token.
//!
//! # Responsibility
//! - Sign in, sign up, sign out and restore a session from the token slot.
//! - Keep the durable token slot in step with the in-memory token.
//!
//! # Invariants
//! - `is_authenticated()` is true iff a (non-empty) token is held.
//! - A failed sign-in leaves any previous token and user untouched.
//! - Sign-out always ends with no token in memory and an empty slot.
//! - A validation result only applies to the token it was issued for.

use super::{StoreError, StoreResult, TokenSource};
use crate::api::{ApiError, AuthApi, SignInRequest, SignInResponse, SignUpRequest};
use crate::model::token::BearerToken;
use crate::model::user::UserProfile;
use crate::storage::TokenStore;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::watch;

pub const SIGN_IN_FAILED: &str = "Sign in failed";
pub const SIGN_UP_FAILED: &str = "Sign up failed";
pub const VERIFY_FAILED: &str = "Failed to verify session";
pub const SESSION_CHANGED: &str = "Session changed during verification";

/// Snapshot of session state published to views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Profile of the signed-in account. Absent after a bare restore.
    pub user: Option<UserProfile>,
    pub token: Option<BearerToken>,
    /// True while a sign-in, sign-up or validation call is in flight.
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Owner of the session state and the durable token slot.
pub struct SessionStore<A: AuthApi> {
    api: A,
    slot: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
}

impl<A: AuthApi> SessionStore<A> {
    /// Creates an empty, signed-out store. Call `restore_session` to pick
    /// up a persisted token.
    pub fn new(api: A, slot: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { api, slot, state }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Exchanges credentials for a token, then persists the token.
    ///
    /// On failure `error` carries the server message (or a generic
    /// fallback) and the previous identity is kept.
    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<UserProfile> {
        self.begin("sign_in");
        let request = SignInRequest::new(email, password);

        match self.api.sign_in(&request).await {
            Ok(SignInResponse { token, user }) => {
                if let Err(err) = self.slot.save(&token) {
                    // The in-memory session still works for this run.
                    error!(
                        "event=sign_in module=session status=error error_code=token_persist_failed error={err}"
                    );
                }
                self.state.send_modify(|state| {
                    state.token = Some(token);
                    state.user = Some(user.clone());
                    state.is_loading = false;
                    state.error = None;
                });
                info!("event=sign_in module=session status=ok user_id={}", user.id);
                Ok(user)
            }
            Err(err) => Err(self.reject("sign_in", &err, SIGN_IN_FAILED)),
        }
    }

    /// Registers a new account. Does not authenticate the caller.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> StoreResult<()> {
        self.begin("sign_up");
        let request = SignUpRequest::new(name, email, password);

        match self.api.sign_up(&request).await {
            Ok(()) => {
                self.state.send_modify(|state| state.is_loading = false);
                info!("event=sign_up module=session status=ok");
                Ok(())
            }
            Err(err) => Err(self.reject("sign_up", &err, SIGN_UP_FAILED)),
        }
    }

    /// Drops the session and the persisted token. Never fails.
    pub fn sign_out(&self) {
        self.state.send_replace(SessionState::default());
        self.clear_slot("sign_out");
        info!("event=sign_out module=session status=ok");
    }

    /// Seeds the token from the durable slot without contacting the server.
    ///
    /// Returns whether a token was found. The profile stays absent; use
    /// `validate_session` to confirm the token and load the profile.
    pub fn restore_session(&self) -> bool {
        let token = match self.slot.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(
                    "event=restore_session module=session status=error error_code=token_load_failed error={err}"
                );
                return false;
            }
        };

        match token {
            Some(token) => {
                self.state.send_modify(|state| state.token = Some(token));
                info!("event=restore_session module=session status=ok restored=true");
                true
            }
            None => {
                info!("event=restore_session module=session status=ok restored=false");
                false
            }
        }
    }

    /// Confirms the held token with the server and loads the profile.
    ///
    /// A 401 ends the session as `sign_out` does and keeps the server
    /// message in `error`. Any other failure keeps the token.
    ///
    /// If the token was replaced or dropped while the call was in flight,
    /// the response is discarded and `SESSION_CHANGED` is returned.
    pub async fn validate_session(&self) -> StoreResult<UserProfile> {
        let Some(token) = self.current_token() else {
            return Err(StoreError::new(super::NOT_SIGNED_IN));
        };
        self.begin("validate_session");

        match self.api.current_user(&token).await {
            Ok(user) => {
                let applied = self.apply_if_current(&token, |state| {
                    state.user = Some(user.clone());
                    state.is_loading = false;
                });
                if !applied {
                    return Err(superseded("validate_session"));
                }
                info!(
                    "event=validate_session module=session status=ok user_id={}",
                    user.id
                );
                Ok(user)
            }
            Err(err) if err.is_unauthorized() => {
                let message = err.user_message(VERIFY_FAILED);
                let applied = self.apply_if_current(&token, |state| {
                    *state = SessionState {
                        error: Some(message.clone()),
                        ..SessionState::default()
                    };
                });
                if !applied {
                    return Err(superseded("validate_session"));
                }
                self.clear_slot("validate_session");
                warn!(
                    "event=validate_session module=session status=error error_code=unauthorized detail=session_cleared"
                );
                Err(StoreError::new(message))
            }
            Err(err) => {
                let message = err.user_message(VERIFY_FAILED);
                let applied = self.apply_if_current(&token, |state| {
                    state.error = Some(message.clone());
                    state.is_loading = false;
                });
                if !applied {
                    return Err(superseded("validate_session"));
                }
                warn!(
                    "event=validate_session module=session status=error error_code={} error={err}",
                    err.code()
                );
                Err(StoreError::new(message))
            }
        }
    }

    /// Restores from the slot and, when a token was found, validates it.
    ///
    /// Returns `Ok(None)` when there was nothing to restore.
    pub async fn restore_and_validate(&self) -> StoreResult<Option<UserProfile>> {
        if !self.restore_session() {
            return Ok(None);
        }
        self.validate_session().await.map(Some)
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    fn begin(&self, operation: &str) {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });
        info!("event={operation} module=session status=start");
    }

    /// Runs `apply` only while `token` is still the held token. Otherwise
    /// just leaves the pending state.
    fn apply_if_current(
        &self,
        token: &BearerToken,
        apply: impl FnOnce(&mut SessionState),
    ) -> bool {
        let mut current = false;
        self.state.send_modify(|state| {
            current = state.token.as_ref() == Some(token);
            if current {
                apply(state);
            } else {
                state.is_loading = false;
            }
        });
        current
    }

    fn reject(&self, operation: &str, err: &ApiError, fallback: &str) -> StoreError {
        let message = err.user_message(fallback);
        self.state.send_modify(|state| {
            state.error = Some(message.clone());
            state.is_loading = false;
        });
        warn!(
            "event={operation} module=session status=error error_code={} error={err}",
            err.code()
        );
        StoreError::new(message)
    }

    fn clear_slot(&self, operation: &str) {
        if let Err(err) = self.slot.clear() {
            error!(
                "event={operation} module=session status=error error_code=token_clear_failed error={err}"
            );
        }
    }
}

impl<A: AuthApi> TokenSource for SessionStore<A> {
    fn current_token(&self) -> Option<BearerToken> {
        self.state.borrow().token.clone()
    }
}

fn superseded(operation: &str) -> StoreError {
    debug!("event={operation} module=session status=ok detail=superseded");
    StoreError::new(SESSION_CHANGED)
}
