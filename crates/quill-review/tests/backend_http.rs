use mockito::{Matcher, Server};
use quill_core::{GeminiConfig, OllamaConfig, QuillError};
use quill_review::backend::{GeminiBackend, OllamaBackend, ReviewBackend, NO_FEEDBACK};
use quill_review::prompt::build_review_prompt;
use serde_json::json;

const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn direct_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn gemini(endpoint: String) -> GeminiBackend {
    let config = GeminiConfig {
        api_key: Some("gem-key".into()),
        endpoint,
        ..GeminiConfig::default()
    };
    GeminiBackend::with_client(&config, direct_client()).unwrap()
}

fn ollama(address: String) -> OllamaBackend {
    let config = OllamaConfig {
        address,
        ..OllamaConfig::default()
    };
    OllamaBackend::with_client(&config, direct_client())
}

#[tokio::test]
async fn gemini_sends_key_and_prompt() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "gem-key".into()))
        .match_body(Matcher::PartialJson(json!({
            "contents": [{ "parts": [{ "text": build_review_prompt("+fn f() {}") }] }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Add a test."}]}}]}"#)
        .create_async()
        .await;

    let review = gemini(format!("{}/v1beta/models", server.url()))
        .generate_review("+fn f() {}")
        .await
        .unwrap();

    assert_eq!(review, "Add a test.");
    mock.assert_async().await;
}

#[tokio::test]
async fn gemini_error_status_is_backend_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"API key not valid"}}"#)
        .create_async()
        .await;

    let err = gemini(format!("{}/v1beta/models", server.url()))
        .generate_review("+x")
        .await
        .unwrap_err();
    mock.assert_async().await;

    match err {
        QuillError::Backend { backend, message } => {
            assert_eq!(backend, "Gemini API");
            assert!(message.contains("400"));
            assert!(message.contains("API key not valid"));
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn ollama_requests_non_streaming_generation() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({
            "model": "codellama",
            "prompt": build_review_prompt("+x"),
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"model":"codellama","response":"Looks good.","done":true}"#)
        .create_async()
        .await;

    let review = ollama(format!("{}/", server.url()))
        .generate_review("+x")
        .await
        .unwrap();

    assert_eq!(review, "Looks good.");
    mock.assert_async().await;
}

#[tokio::test]
async fn ollama_missing_response_field_uses_placeholder() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(r#"{"done":true}"#)
        .create_async()
        .await;

    let review = ollama(server.url()).generate_review("+x").await.unwrap();
    assert_eq!(review, NO_FEEDBACK);
}

#[tokio::test]
async fn ollama_server_error_is_backend_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(500)
        .with_body(r#"{"error":"model not found"}"#)
        .create_async()
        .await;

    let err = ollama(server.url()).generate_review("+x").await.unwrap_err();
    assert!(err.to_string().starts_with("error calling Ollama: API error 500"));
}

#[tokio::test]
async fn long_error_body_is_truncated() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(502)
        .with_body("x".repeat(5000))
        .create_async()
        .await;

    let err = ollama(server.url()).generate_review("+x").await.unwrap_err();
    let QuillError::Backend { message, .. } = err else {
        panic!("expected backend error");
    };
    assert!(message.len() < 300, "message was {} bytes", message.len());
}

#[tokio::test]
async fn malformed_json_is_backend_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = ollama(server.url()).generate_review("+x").await.unwrap_err();
    assert!(err.to_string().contains("failed to parse response"));
}

#[tokio::test]
async fn unreachable_backend_is_backend_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = ollama(format!("http://{addr}"))
        .generate_review("+x")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("request failed"));
}
