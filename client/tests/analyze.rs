//! Integration tests for the analysis client against a mock HTTP server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use dymis_client::{AnalysisClient, ClientConfig};
use dymis_core::{AnalysisExecutor, ErrorKind};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Fixtures
// ============================================================================

fn client_for(server: &MockServer) -> AnalysisClient {
    AnalysisClient::new(ClientConfig::new(server.uri()).with_api_key("test-key")).unwrap()
}

fn sample_result() -> serde_json::Value {
    json!({
        "trust_score": 72,
        "result_summary": "Mostly reliable",
        "original_content": "hello",
        "educational_breakdown": [
            {"title": "Loaded language", "explanation": "Emotive wording", "quote": "shocking"},
            {"title": "Missing source", "explanation": "No citation", "quote": "experts say"}
        ]
    })
}

/// Serve one response whose headers arrive but whose body stalls halfway
async fn stalled_body_server(status_line: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0_u8; 4096];
        let _ = socket.read(&mut request).await;

        let head = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: 128\r\n\r\n{{\"trust_score\": 7"
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    format!("http://{addr}")
}

fn impatient_client(base_url: String) -> AnalysisClient {
    AnalysisClient::new(
        ClientConfig::new(base_url)
            .with_api_key("k")
            .with_timeout(Duration::from_millis(300)),
    )
    .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_successful_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(header("x-api-key", "test-key"))
        .and(body_json(json!({"content": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_result()))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).execute("hello").await.unwrap();

    assert!((result.trust_score - 72.0).abs() < f64::EPSILON);
    assert_eq!(result.original_content, "hello");
    assert_eq!(result.educational_breakdown.len(), 2);
    assert_eq!(result.educational_breakdown[0].title, "Loaded language");
    assert_eq!(result.educational_breakdown[1].title, "Missing source");
}

#[tokio::test]
async fn test_blank_content_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_result()))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    for blank in ["", "   ", "\n"] {
        let err = client.execute(blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Content cannot be empty");
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_uses_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "overloaded"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).execute("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.to_string(), "overloaded");
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_server_error_uses_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})))
        .mount(&server)
        .await;

    let err = client_for(&server).execute("hello").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid API key");
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client_for(&server).execute("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn test_success_with_unparsable_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not-json"))
        .mount(&server)
        .await;

    let err = client_for(&server).execute("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    assert_eq!(err.to_string(), "Invalid response format from server");
}

#[tokio::test]
async fn test_success_with_non_object_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let err = client_for(&server).execute("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_transport_error() {
    // Bind then drop a listener so nothing is accepting on the port
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = AnalysisClient::new(
        ClientConfig::new(format!("http://127.0.0.1:{port}")).with_api_key("k"),
    )
    .unwrap();
    let err = client.execute("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sample_result())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = AnalysisClient::new(
        ClientConfig::new(server.uri())
            .with_api_key("k")
            .with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let err = client.execute("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_timeout_while_reading_success_body_is_a_transport_error() {
    let client = impatient_client(stalled_body_server("200 OK").await);

    let err = client.execute("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_ne!(err.to_string(), "Invalid response format from server");
}

#[tokio::test]
async fn test_timeout_while_reading_error_body_is_a_transport_error() {
    let client = impatient_client(stalled_body_server("500 Internal Server Error").await);

    let err = client.execute("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_missing_api_key_still_sends_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_result()))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalysisClient::new(ClientConfig::new(server.uri())).unwrap();
    client.execute("hello").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("x-api-key").is_none());
}

#[tokio::test]
async fn test_executor_trait_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_result()))
        .mount(&server)
        .await;

    let executor: Box<dyn AnalysisExecutor> = Box::new(client_for(&server));
    let result = executor.execute("hello").await.unwrap();
    assert_eq!(result.result_summary, "Mostly reliable");
}

#[tokio::test]
async fn test_health_check_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    assert!(client_for(&server).check_health().await);
}

#[tokio::test]
async fn test_health_check_non_json_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    assert!(client_for(&server).check_health().await);
}

#[tokio::test]
async fn test_health_check_non_json_other_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert!(!client_for(&server).check_health().await);
}

#[tokio::test]
async fn test_health_check_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    assert!(!client_for(&server).check_health().await);
}
