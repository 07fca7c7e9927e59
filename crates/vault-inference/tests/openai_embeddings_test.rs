//! Embedding backend tests against a mock OpenAI-compatible server.

use vault_core::{EmbeddingBackend, Error};
use vault_inference::openai::{OpenAIBackend, OpenAIConfig};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer, api_key: Option<&str>) -> OpenAIBackend {
    OpenAIBackend::new(OpenAIConfig {
        base_url: server.uri(),
        api_key: api_key.map(str::to_string),
        embed_model: "test-embed".to_string(),
        embed_dimension: 3,
        timeout_seconds: 5,
    })
    .expect("Failed to create backend")
}

#[tokio::test]
async fn test_embed_sends_openai_shape_with_bearer_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_json(serde_json::json!({
            "model": "test-embed",
            "input": ["X Y a b"],
            "encoding_format": "float"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}],
            "model": "test-embed",
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server, Some("test-key"));
    let vector = backend.embed_text("X Y a b").await.expect("embedding");

    assert_eq!(vector.as_slice(), &[0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_embed_orders_results_by_index() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"embedding": [0.0, 1.0, 0.0], "index": 1},
                {"embedding": [1.0, 0.0, 0.0], "index": 0}
            ]
        })))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server, None);
    let vectors = backend
        .embed_texts(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors[0].as_slice(), &[1.0, 0.0, 0.0]);
    assert_eq!(vectors[1].as_slice(), &[0.0, 1.0, 0.0]);
}

#[tokio::test]
async fn test_error_status_becomes_embedding_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Incorrect API key", "type": "invalid_request_error"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server, Some("bad-key"));
    let err = backend.embed_text("hello").await.unwrap_err();

    match err {
        Error::Embedding(msg) => {
            assert!(msg.contains("Authentication failed"));
            assert!(msg.contains("Incorrect API key"));
        }
        other => panic!("expected embedding error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server, None);
    let err = backend.embed_text("hello").await.unwrap_err();

    assert!(matches!(err, Error::Embedding(ref msg) if msg.contains("upstream down")));
}

#[tokio::test]
async fn test_missing_embeddings_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server, None);
    let err = backend.embed_text("hello").await.unwrap_err();

    assert!(matches!(err, Error::Embedding(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_embedding_error() {
    let backend = OpenAIBackend::new(OpenAIConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
        ..Default::default()
    })
    .unwrap();

    let err = backend.embed_text("hello").await.unwrap_err();
    assert!(matches!(err, Error::Embedding(ref msg) if msg.starts_with("Request failed")));
}
