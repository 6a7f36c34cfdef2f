//! Remote notes API contract.
//!
//! # Responsibility
//! - Define the async seams (`AuthApi`, `NotesApi`) that stores depend on.
//! - Define request/response envelopes and the transport error taxonomy.
//!
//! # Invariants
//! - Server-supplied `{message}` bodies are surfaced verbatim.
//! - Credentials never appear in `Debug` output.

use crate::model::note::{Note, NoteDraft, NoteId};
use crate::model::token::BearerToken;
use crate::model::user::UserProfile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

mod http;

pub use http::HttpApiClient;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of one remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Non-success HTTP status, with the server's `message` when present.
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    /// Connection, TLS or timeout failure; no response was received.
    #[error("transport failure: {0}")]
    Transport(String),
    /// A success response whose body did not match the contract.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Server-supplied message, if the failure carried a non-blank one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Message shown to the user: the server's text or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    /// Whether the server rejected the credential (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status: 401, .. })
    }

    /// Short stable label for log records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Server { .. } => "server",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
        }
    }
}

/// `POST /api/auth/signin` body.
#[derive(Clone, Serialize)]
pub struct SignInRequest {
    pub user_email: String,
    pub password: String,
}

impl SignInRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_email: email.into(),
            password: password.into(),
        }
    }
}

impl Debug for SignInRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("user_email", &self.user_email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /api/auth/signup` body.
#[derive(Clone, Serialize)]
pub struct SignUpRequest {
    pub user_name: String,
    pub user_email: String,
    pub password: String,
}

impl SignUpRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user_name: name.into(),
            user_email: email.into(),
            password: password.into(),
        }
    }
}

impl Debug for SignUpRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("user_name", &self.user_name)
            .field("user_email", &self.user_email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /api/auth/signin` success body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignInResponse {
    pub token: BearerToken,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesEnvelope {
    pub notes: Vec<Note>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteEnvelope {
    pub note: Note,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthBody {
    pub status: String,
}

/// Account endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token and profile.
    async fn sign_in(&self, request: &SignInRequest) -> ApiResult<SignInResponse>;
    /// Registers an account. Produces no token.
    async fn sign_up(&self, request: &SignUpRequest) -> ApiResult<()>;
    /// Resolves the profile that owns `token`.
    async fn current_user(&self, token: &BearerToken) -> ApiResult<UserProfile>;
}

/// Note endpoints. Every call is scoped to the account owning `token`.
#[async_trait]
pub trait NotesApi: Send + Sync {
    async fn list_notes(&self, token: &BearerToken) -> ApiResult<Vec<Note>>;
    async fn get_note(&self, token: &BearerToken, id: &NoteId) -> ApiResult<Note>;
    async fn create_note(&self, token: &BearerToken, draft: &NoteDraft) -> ApiResult<()>;
    async fn update_note(
        &self,
        token: &BearerToken,
        id: &NoteId,
        draft: &NoteDraft,
    ) -> ApiResult<()>;
    async fn delete_note(&self, token: &BearerToken, id: &NoteId) -> ApiResult<()>;
}
