#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use jotter_core::api::{SignInRequest, SignInResponse, SignUpRequest};
use jotter_core::{
    ApiError, ApiResult, AuthApi, BearerToken, Note, NoteDraft, NoteId, NotesApi, UserProfile,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// One recorded call against `FakeApi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SignIn { email: String, password: String },
    SignUp { name: String, email: String },
    CurrentUser { token: String },
    ListNotes { token: String },
    GetNote { id: String },
    CreateNote { title: String, content: String },
    UpdateNote { id: String, title: String, content: String },
    DeleteNote { id: String },
}

type Gate = Option<oneshot::Receiver<()>>;

/// Queued responses, each optionally held back until its gate fires.
type Script<T> = Mutex<VecDeque<(Gate, ApiResult<T>)>>;

#[derive(Default)]
struct Inner {
    sign_in: Script<SignInResponse>,
    sign_up: Script<()>,
    current_user: Script<UserProfile>,
    list: Script<Vec<Note>>,
    get: Script<Note>,
    writes: Script<()>,
    calls: Mutex<Vec<Call>>,
}

/// Scripted in-process API. Unscripted calls fail with a transport error.
#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Inner>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sign_in(&self, result: ApiResult<SignInResponse>) {
        push(&self.inner.sign_in, None, result);
    }

    /// Queues a sign-in response that is held back until the returned sender fires.
    pub fn push_gated_sign_in(&self, result: ApiResult<SignInResponse>) -> oneshot::Sender<()> {
        push_gated(&self.inner.sign_in, result)
    }

    pub fn push_sign_up(&self, result: ApiResult<()>) {
        push(&self.inner.sign_up, None, result);
    }

    pub fn push_current_user(&self, result: ApiResult<UserProfile>) {
        push(&self.inner.current_user, None, result);
    }

    pub fn push_gated_current_user(&self, result: ApiResult<UserProfile>) -> oneshot::Sender<()> {
        push_gated(&self.inner.current_user, result)
    }

    pub fn push_list(&self, result: ApiResult<Vec<Note>>) {
        push(&self.inner.list, None, result);
    }

    pub fn push_gated_list(&self, result: ApiResult<Vec<Note>>) -> oneshot::Sender<()> {
        push_gated(&self.inner.list, result)
    }

    pub fn push_get(&self, result: ApiResult<Note>) {
        push(&self.inner.get, None, result);
    }

    pub fn push_gated_get(&self, result: ApiResult<Note>) -> oneshot::Sender<()> {
        push_gated(&self.inner.get, result)
    }

    /// Queues the result of the next create, update or delete call.
    pub fn push_write(&self, result: ApiResult<()>) {
        push(&self.inner.writes, None, result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Yields until at least `count` calls were recorded.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.inner.calls.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().unwrap().push(call);
    }

}

fn push<T>(script: &Script<T>, gate: Gate, result: ApiResult<T>) {
    script.lock().unwrap().push_back((gate, result));
}

fn push_gated<T>(script: &Script<T>, result: ApiResult<T>) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    push(script, Some(rx), result);
    tx
}

/// Pops the next scripted response and waits for its gate, if any.
/// Unscripted calls fail with a transport error.
async fn next<T>(script: &Script<T>) -> ApiResult<T> {
    let scripted = script.lock().unwrap().pop_front();
    let Some((gate, result)) = scripted else {
        return Err(ApiError::Transport("no scripted response".to_string()));
    };
    if let Some(gate) = gate {
        let _ = gate.await;
    }
    result
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn sign_in(&self, request: &SignInRequest) -> ApiResult<SignInResponse> {
        self.record(Call::SignIn {
            email: request.user_email.clone(),
            password: request.password.clone(),
        });
        next(&self.inner.sign_in).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> ApiResult<()> {
        self.record(Call::SignUp {
            name: request.user_name.clone(),
            email: request.user_email.clone(),
        });
        next(&self.inner.sign_up).await
    }

    async fn current_user(&self, token: &BearerToken) -> ApiResult<UserProfile> {
        self.record(Call::CurrentUser {
            token: token.as_str().to_string(),
        });
        next(&self.inner.current_user).await
    }
}

#[async_trait]
impl NotesApi for FakeApi {
    async fn list_notes(&self, token: &BearerToken) -> ApiResult<Vec<Note>> {
        self.record(Call::ListNotes {
            token: token.as_str().to_string(),
        });
        next(&self.inner.list).await
    }

    async fn get_note(&self, _token: &BearerToken, id: &NoteId) -> ApiResult<Note> {
        self.record(Call::GetNote { id: id.clone() });
        next(&self.inner.get).await
    }

    async fn create_note(&self, _token: &BearerToken, draft: &NoteDraft) -> ApiResult<()> {
        self.record(Call::CreateNote {
            title: draft.title.clone(),
            content: draft.content.clone(),
        });
        next(&self.inner.writes).await
    }

    async fn update_note(
        &self,
        _token: &BearerToken,
        id: &NoteId,
        draft: &NoteDraft,
    ) -> ApiResult<()> {
        self.record(Call::UpdateNote {
            id: id.clone(),
            title: draft.title.clone(),
            content: draft.content.clone(),
        });
        next(&self.inner.writes).await
    }

    async fn delete_note(&self, _token: &BearerToken, id: &NoteId) -> ApiResult<()> {
        self.record(Call::DeleteNote { id: id.clone() });
        next(&self.inner.writes).await
    }
}

pub fn token(raw: &str) -> BearerToken {
    BearerToken::new(raw).unwrap()
}

pub fn user(id: &str, name: &str, email: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        display_name: name.to_string(),
        email: email.to_string(),
    }
}

pub fn note(id: &str, title: &str) -> Note {
    let at = NaiveDateTime::parse_from_str("2024-05-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    Note {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("{title} body"),
        created_at: at,
        updated_at: at,
    }
}

pub fn server_error(status: u16, message: &str) -> ApiError {
    ApiError::Server {
        status,
        message: Some(message.to_string()),
    }
}
