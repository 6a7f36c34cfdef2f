//! `reqwest` implementation of the API seams.

use super::{
    ApiError, ApiResult, AuthApi, ErrorBody, HealthBody, NoteEnvelope, NotesApi, NotesEnvelope,
    SignInRequest, SignInResponse, SignUpRequest, UserEnvelope,
};
use crate::config::{ClientConfig, ConfigError};
use crate::model::note::{Note, NoteDraft, NoteId};
use crate::model::token::BearerToken;
use crate::model::user::UserProfile;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Instant;

/// HTTP client for the notes API.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
}

impl HttpApiClient {
    /// Builds a client from validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(config.api_base_url()).map_err(|err| {
            ConfigError::InvalidBaseUrl(format!("{}: {err}", config.api_base_url()))
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Calls `GET /api/health` and returns the reported status string.
    pub async fn health(&self) -> ApiResult<String> {
        let request = self.client.get(self.endpoint(&["health"]));
        let body: HealthBody = self.send_json("health", request).await?;
        Ok(body.status)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Base URLs are validated as http(s), which always support segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder, token: &BearerToken) -> RequestBuilder {
        request.header(AUTHORIZATION, token.authorization_value())
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ApiResult<Response> {
        let started_at = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=http_call module=api status=error op={operation} duration_ms={} error_code=transport error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(ApiError::Transport(err.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(
                "event=http_call module=api status=ok op={operation} http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.message);
        warn!(
            "event=http_call module=api status=error op={operation} http_status={} duration_ms={} error_code=server",
            status.as_u16(),
            started_at.elapsed().as_millis()
        );
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        let response = self.execute(operation, request).await?;
        response.json::<T>().await.map_err(|err| {
            warn!("event=http_decode module=api status=error op={operation} error={err}");
            ApiError::Decode(err.to_string())
        })
    }

    async fn send_empty(&self, operation: &'static str, request: RequestBuilder) -> ApiResult<()> {
        self.execute(operation, request).await.map(|_| ())
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn sign_in(&self, request: &SignInRequest) -> ApiResult<SignInResponse> {
        let call = self
            .client
            .post(self.endpoint(&["auth", "signin"]))
            .json(request);
        self.send_json("sign_in", call).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> ApiResult<()> {
        let call = self
            .client
            .post(self.endpoint(&["auth", "signup"]))
            .json(request);
        self.send_empty("sign_up", call).await
    }

    async fn current_user(&self, token: &BearerToken) -> ApiResult<UserProfile> {
        let call = self.authorized(self.client.get(self.endpoint(&["auth", "me"])), token);
        let envelope: UserEnvelope = self.send_json("current_user", call).await?;
        Ok(envelope.user)
    }
}

#[async_trait]
impl NotesApi for HttpApiClient {
    async fn list_notes(&self, token: &BearerToken) -> ApiResult<Vec<Note>> {
        let call = self.authorized(self.client.get(self.endpoint(&["notes"])), token);
        let envelope: NotesEnvelope = self.send_json("list_notes", call).await?;
        Ok(envelope.notes)
    }

    async fn get_note(&self, token: &BearerToken, id: &NoteId) -> ApiResult<Note> {
        let call = self.authorized(
            self.client.get(self.endpoint(&["notes", id.as_str()])),
            token,
        );
        let envelope: NoteEnvelope = self.send_json("get_note", call).await?;
        Ok(envelope.note)
    }

    async fn create_note(&self, token: &BearerToken, draft: &NoteDraft) -> ApiResult<()> {
        let call = self.authorized(
            self.client.post(self.endpoint(&["notes"])).json(draft),
            token,
        );
        self.send_empty("create_note", call).await
    }

    async fn update_note(
        &self,
        token: &BearerToken,
        id: &NoteId,
        draft: &NoteDraft,
    ) -> ApiResult<()> {
        let call = self.authorized(
            self.client
                .put(self.endpoint(&["notes", id.as_str()]))
                .json(draft),
            token,
        );
        self.send_empty("update_note", call).await
    }

    async fn delete_note(&self, token: &BearerToken, id: &NoteId) -> ApiResult<()> {
        let call = self.authorized(
            self.client.delete(self.endpoint(&["notes", id.as_str()])),
            token,
        );
        self.send_empty("delete_note", call).await
    }
}
