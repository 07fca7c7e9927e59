//! Client behavior against a mocked thoughtvault API.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use vault_client::{
    ApiClient, AuthSession, AuthState, ClientConfig, CreateNoteRequest, FileTokenStore,
    MemoryTokenStore, Notice, NotesClient, SearchRequest, SemanticSearch, TokenStore,
    UpdateNoteRequest,
};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "0190f5a0-0000-7000-8000-000000000001";
const NOTE_ID: &str = "0190f5a0-0000-7000-8000-0000000000aa";

fn user_json() -> serde_json::Value {
    json!({
        "id": USER_ID,
        "email": "ada@example.com",
        "username": "ada",
        "isActive": true,
        "createdAt": "2026-01-01T00:00:00Z"
    })
}

fn note_json(title: &str) -> serde_json::Value {
    json!({
        "id": "0190f5a0-0000-7000-8000-0000000000aa",
        "title": title,
        "content": "Notes about pgvector",
        "type": "note",
        "tags": [{"id": "0190f5a0-0000-7000-8000-0000000000bb", "name": "db"}],
        "date": "2026-01-02T00:00:00Z",
        "updatedAt": "2026-01-02T00:00:00Z",
        "vectorId": "0190f5a0-0000-7000-8000-0000000000cc"
    })
}

fn client(server: &MockServer, tokens: Arc<dyn TokenStore>) -> ApiClient {
    ApiClient::new(&ClientConfig::new(server.uri()), tokens).unwrap()
}

async fn signed_in(server: &MockServer) -> (ApiClient, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::with_token("tv_at_live"));
    let api = client(server, tokens.clone());
    assert!(AuthSession::new(api.clone()).restore().await.unwrap());
    (api, tokens)
}

#[tokio::test]
async fn test_login_stores_token_and_loads_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("username=ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tv_at_fresh",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tv_at_fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(MemoryTokenStore::new());
    let api = client(&server, tokens.clone());
    let mut notices = api.notices().subscribe();
    let session = AuthSession::new(api);

    session.login("ada", "correct horse battery").await.unwrap();

    let state = session.state();
    assert_eq!(state.token(), Some("tv_at_fresh"));
    assert_eq!(state.user().map(|u| u.username.as_str()), Some("ada"));
    assert_eq!(
        tokens.load().await.unwrap().as_deref(),
        Some("tv_at_fresh")
    );
    assert_eq!(notices.recv().await.unwrap(), Notice::login_succeeded());
}

#[tokio::test]
async fn test_login_failure_stays_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Incorrect username or password"})),
        )
        .mount(&server)
        .await;

    let tokens = Arc::new(MemoryTokenStore::new());
    let api = client(&server, tokens.clone());
    let mut notices = api.notices().subscribe();
    let session = AuthSession::new(api);

    let err = session.login("ada", "wrong-password").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("Incorrect username or password"));
    assert_eq!(session.state(), AuthState::SignedOut);
    assert_eq!(tokens.load().await.unwrap(), None);
    assert_eq!(notices.recv().await.unwrap(), Notice::login_failed());
}

#[tokio::test]
async fn test_failed_login_forgets_previous_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("authorization", "Bearer tv_at_old"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Incorrect username or password"})),
        )
        .mount(&server)
        .await;

    let tokens = Arc::new(MemoryTokenStore::with_token("tv_at_old"));
    let api = client(&server, tokens.clone());
    let session = AuthSession::new(api);
    assert!(session.restore().await.unwrap());

    session.login("grace", "wrong-password").await.unwrap_err();

    assert_eq!(session.state(), AuthState::SignedOut);
    assert_eq!(tokens.load().await.unwrap(), None);

    // A later start must not revive the old account.
    let next = AuthSession::new(client(&server, tokens.clone()));
    assert!(!next.restore().await.unwrap());
    assert_eq!(next.state(), AuthState::SignedOut);
}

#[tokio::test]
async fn test_rejected_token_signs_out_and_clears_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Could not validate credentials"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (api, tokens) = signed_in(&server).await;
    let mut notices = api.notices().subscribe();
    let mut state = api.subscribe();

    let err = NotesClient::new(api.clone()).list().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(api.auth_state(), AuthState::SignedOut);
    assert!(state.has_changed().unwrap());
    assert_eq!(*state.borrow_and_update(), AuthState::SignedOut);
    assert_eq!(tokens.load().await.unwrap(), None);
    assert_eq!(notices.recv().await.unwrap(), Notice::session_expired());
}

#[tokio::test]
async fn test_signed_out_requests_never_reach_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemoryTokenStore::new()));
    let err = NotesClient::new(api).list().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(note_json("x")))
        .expect(0)
        .mount(&server)
        .await;

    let (api, _) = signed_in(&server).await;
    let notes = NotesClient::new(api);

    let blank_title = CreateNoteRequest {
        title: "   ".to_string(),
        content: "body".to_string(),
        note_type: Default::default(),
        tags: vec![],
        store_vector: true,
    };
    assert!(notes.create(blank_title).await.is_err());

    let bad_link = CreateNoteRequest {
        title: "Docs".to_string(),
        content: "not a url".to_string(),
        note_type: vault_client::NoteType::Link,
        tags: vec![],
        store_vector: true,
    };
    assert!(notes.create(bad_link).await.is_err());
}

#[tokio::test]
async fn test_list_is_cached_until_a_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .and(header("authorization", "Bearer tv_at_live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([note_json("Vectors")])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(note_json("Fresh")))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = signed_in(&server).await;
    let mut notices = api.notices().subscribe();
    let notes = NotesClient::new(api);

    assert_eq!(notes.list().await.unwrap().len(), 1);
    assert_eq!(notes.list().await.unwrap()[0].title, "Vectors");

    let created = notes
        .create(CreateNoteRequest {
            title: "Fresh".to_string(),
            content: "Notes about pgvector".to_string(),
            note_type: Default::default(),
            tags: vec!["db".to_string()],
            store_vector: true,
        })
        .await
        .unwrap();
    assert_eq!(created.title, "Fresh");
    assert_eq!(created.tag_names(), vec!["db"]);
    assert!(created.has_embedding());
    assert_eq!(notices.recv().await.unwrap(), Notice::note_created(&created));

    // Refetched after the write.
    notes.list().await.unwrap();
}

#[tokio::test]
async fn test_list_in_flight_during_write_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([note_json("Old")]))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([note_json("New")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(note_json("New")))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = signed_in(&server).await;
    let notes = NotesClient::new(api);

    let slow = tokio::spawn({
        let notes = notes.clone();
        async move { notes.list().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    notes
        .create(CreateNoteRequest {
            title: "New".to_string(),
            content: "Notes about pgvector".to_string(),
            note_type: Default::default(),
            tags: vec![],
            store_vector: true,
        })
        .await
        .unwrap();

    // The slow caller still gets what it fetched.
    assert_eq!(slow.await.unwrap().unwrap()[0].title, "Old");
    // The next caller does not.
    assert_eq!(notes.list().await.unwrap()[0].title, "New");
}

#[tokio::test]
async fn test_update_and_delete_emit_notices() {
    let server = MockServer::start().await;
    let note_path = format!("/notes/{}", NOTE_ID);
    Mock::given(method("PUT"))
        .and(path(note_path.as_str()))
        .and(body_json(json!({"title": "Renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_json("Renamed")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(note_path.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = signed_in(&server).await;
    let mut notices = api.notices().subscribe();
    let notes = NotesClient::new(api);
    let id: Uuid = NOTE_ID.parse().unwrap();

    let updated = notes
        .update(
            id,
            UpdateNoteRequest {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(notices.recv().await.unwrap(), Notice::note_updated());

    notes.delete(id).await.unwrap();
    assert_eq!(notices.recv().await.unwrap(), Notice::note_deleted());
}

#[tokio::test]
async fn test_update_and_delete_failures_emit_notices() {
    let server = MockServer::start().await;
    let note_path = format!("/notes/{}", NOTE_ID);
    Mock::given(method("PUT"))
        .and(path(note_path.as_str()))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_json(json!({"error": "Embedding failed: upstream timeout"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(note_path.as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Note not found"})))
        .mount(&server)
        .await;

    let (api, _) = signed_in(&server).await;
    let mut notices = api.notices().subscribe();
    let notes = NotesClient::new(api.clone());
    let id: Uuid = NOTE_ID.parse().unwrap();

    let err = notes
        .update(
            id,
            UpdateNoteRequest {
                content: Some("rewritten".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, vault_client::Error::Embedding(_)));
    assert_eq!(notices.recv().await.unwrap(), Notice::note_update_failed());

    let err = notes.delete(id).await.unwrap_err();
    assert!(matches!(err, vault_client::Error::NotFound(_)));
    assert_eq!(notices.recv().await.unwrap(), Notice::note_delete_failed());
    assert!(api.auth_state().is_authenticated());
}

#[tokio::test]
async fn test_create_failure_emits_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_json(json!({"error": "Embedding failed: upstream timeout"})),
        )
        .mount(&server)
        .await;

    let (api, _) = signed_in(&server).await;
    let mut notices = api.notices().subscribe();

    let err = NotesClient::new(api.clone())
        .create(CreateNoteRequest {
            title: "Vectors".to_string(),
            content: "body".to_string(),
            note_type: Default::default(),
            tags: vec![],
            store_vector: true,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, vault_client::Error::Embedding(_)));
    assert!(api.auth_state().is_authenticated());
    assert_eq!(notices.recv().await.unwrap(), Notice::note_create_failed());
}

#[tokio::test]
async fn test_restore_from_token_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("token.json"));

    let api = client(&server, Arc::new(store.clone()));
    let session = AuthSession::new(api);
    assert!(!session.restore().await.unwrap());
    assert_eq!(session.state(), AuthState::SignedOut);

    store.save("tv_at_saved").await.unwrap();
    assert!(session.restore().await.unwrap());
    assert_eq!(session.state().token(), Some("tv_at_saved"));
    assert!(session.state().user().is_none());
}

#[tokio::test]
async fn test_register_does_not_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "username": "ada",
            "password": "correct horse battery"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemoryTokenStore::new()));
    let mut notices = api.notices().subscribe();
    let session = AuthSession::new(api);

    let user = session
        .register(vault_client::RegisterRequest {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password: "correct horse battery".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.email, "ada@example.com");
    assert_eq!(session.state(), AuthState::SignedOut);
    assert_eq!(notices.recv().await.unwrap(), Notice::registered());
}

#[tokio::test]
async fn test_logout_signs_out_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (api, tokens) = signed_in(&server).await;
    let session = AuthSession::new(api);

    session.logout().await.unwrap();

    assert_eq!(session.state(), AuthState::SignedOut);
    assert_eq!(tokens.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_search_posts_query_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({"query": "vector databases", "limit": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "0190f5a0-0000-7000-8000-0000000000aa",
                "title": "Vectors",
                "content": "Notes about pgvector",
                "type": "note",
                "tags": [],
                "date": "2026-01-02T00:00:00Z",
                "updatedAt": "2026-01-02T00:00:00Z",
                "similarity": 0.91
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = signed_in(&server).await;
    let hits = api
        .search(SearchRequest::new("vector databases"))
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].note.title, "Vectors");
    assert!((hits[0].similarity - 0.91).abs() < 1e-9);
}
