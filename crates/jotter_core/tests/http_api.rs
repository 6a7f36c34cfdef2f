use jotter_core::api::{SignInRequest, SignUpRequest};
use jotter_core::{
    ApiError, AuthApi, BearerToken, ClientConfig, HttpApiClient, NoteDraft, NotesApi,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpApiClient {
    let config = ClientConfig::builder()
        .api_base_url(server.uri())
        .build()
        .unwrap();
    HttpApiClient::new(&config).unwrap()
}

fn bearer() -> BearerToken {
    BearerToken::new("tok123").unwrap()
}

fn note_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "note_id": id,
        "note_title": title,
        "note_content": "body",
        "created_on": "2024-05-01T10:00:00",
        "last_update": "2024-05-02T08:15:30.250000"
    })
}

#[tokio::test]
async fn sign_in_posts_credentials_and_decodes_token_and_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .and(body_json(json!({"user_email": "a@b.com", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok123",
            "user": {"user_id": "u1", "user_name": "A", "user_email": "a@b.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .sign_in(&SignInRequest::new("a@b.com", "secret1"))
        .await
        .unwrap();

    assert_eq!(response.token.as_str(), "tok123");
    assert_eq!(response.user.id, "u1");
    assert_eq!(response.user.display_name, "A");
}

#[tokio::test]
async fn sign_in_rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .sign_in(&SignInRequest::new("a@b.com", "nope"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.server_message(), Some("Invalid credentials"));
}

#[tokio::test]
async fn sign_up_posts_all_three_fields_and_ignores_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .and(body_json(json!({
            "user_name": "A",
            "user_email": "a@b.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "User created successfully",
            "user": {"user_id": "u1", "user_name": "A", "user_email": "a@b.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .sign_up(&SignUpRequest::new("A", "a@b.com", "secret1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn current_user_sends_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"user_id": "u1", "user_name": "A", "user_email": "a@b.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client_for(&server).current_user(&bearer()).await.unwrap();
    assert_eq!(profile.email, "a@b.com");
}

#[tokio::test]
async fn list_notes_decodes_envelope_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes"))
        .and(header("Authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notes": [note_json("n1", "T1"), note_json("n2", "T2")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notes = client_for(&server).list_notes(&bearer()).await.unwrap();

    let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "n2"]);
    assert_eq!(notes[1].title, "T2");
}

#[tokio::test]
async fn get_note_decodes_single_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes/n1"))
        .and(header("Authorization", "Bearer tok123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"note": note_json("n1", "T1")})),
        )
        .mount(&server)
        .await;

    let note = client_for(&server)
        .get_note(&bearer(), &"n1".to_string())
        .await
        .unwrap();
    assert_eq!(note.title, "T1");
}

#[tokio::test]
async fn write_endpoints_use_expected_verbs_paths_and_bodies() {
    let server = MockServer::start().await;
    let draft_body = json!({"note_title": "Title", "note_content": "Content"});
    Mock::given(method("POST"))
        .and(path("/api/notes"))
        .and(header("Authorization", "Bearer tok123"))
        .and(body_json(draft_body.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Note created successfully",
            "note": note_json("n9", "Title")
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/notes/n1"))
        .and(header("Authorization", "Bearer tok123"))
        .and(body_json(draft_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/notes/n1"))
        .and(header("Authorization", "Bearer tok123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Note deleted successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let draft = NoteDraft::new("Title", "Content");
    let id = "n1".to_string();
    client.create_note(&bearer(), &draft).await.unwrap();
    client.update_note(&bearer(), &id, &draft).await.unwrap();
    client.delete_note(&bearer(), &id).await.unwrap();
}

#[tokio::test]
async fn non_json_error_body_has_no_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/notes/n1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_note(&bearer(), &"n1".to_string())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Server {
            status: 502,
            message: None
        }
    );
    assert_eq!(err.user_message("Failed to delete note"), "Failed to delete note");
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).list_notes(&bearer()).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = ClientConfig::builder()
        .api_base_url(format!("http://{addr}"))
        .build()
        .unwrap();
    let client = HttpApiClient::new(&config).unwrap();

    let err = client.list_notes(&bearer()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn health_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).health().await.unwrap(), "healthy");
}
