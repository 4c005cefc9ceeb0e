//! Analysis API client implementation

use crate::config::{ClientConfig, ConfigError};
use dymis_core::{AnalysisError, AnalysisExecutor, AnalysisRequest, AnalysisResult};
use futures::future::BoxFuture;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, PRAGMA},
};
use serde_json::Value;

/// Path of the analysis endpoint, relative to the base URL
pub const ANALYZE_PATH: &str = "/api/v1/analyze";

/// Path of the health endpoint, relative to the base URL
pub const HEALTH_PATH: &str = "/health";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

const JSON: &str = "application/json";

/// Analysis API client
#[derive(Clone, Debug)]
pub struct AnalysisClient {
    client: Client,
    config: ClientConfig,
}

impl AnalysisClient {
    /// Create a client from explicit configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is incomplete in strict
    /// mode, or if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a client from `DYMIS_*` environment variables
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`] and [`AnalysisClient::new`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit `content` for analysis
    ///
    /// Blank content fails immediately without any network activity.
    /// Exactly one request is made otherwise; there are no retries.
    ///
    /// # Errors
    ///
    /// - `Validation`: `content` is empty or whitespace only
    /// - `Transport`: no response was obtained
    /// - `Server`: non-success status, message taken from the body's `detail`
    ///   or `message` field when available
    /// - `InvalidResponse`: success status with a body that is not a JSON object
    #[tracing::instrument(skip(self, content), fields(content_len = content.len()), name = "analyze")]
    pub async fn execute(&self, content: &str) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalysisRequest::new(content)?;

        let mut builder = self
            .client
            .post(self.config.endpoint(ANALYZE_PATH))
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header(API_KEY_HEADER, api_key);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "Analysis request failed before a response was received");
            AnalysisError::transport(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(status = status.as_u16(), error = %e, "Failed to read analysis response body");
            AnalysisError::transport(e.to_string())
        })?;

        if !status.is_success() {
            let error = server_error(status, &body);
            tracing::error!(status = status.as_u16(), error = %error, "Analysis rejected by server");
            return Err(error);
        }

        let result = parse_result(&body)?;
        tracing::debug!(trust_score = result.trust_score, "Analysis completed");
        Ok(result)
    }

    /// Probe the backend health endpoint
    ///
    /// A success status counts as healthy; a JSON body is logged when present,
    /// otherwise only a plain `200` is accepted. Any failure yields `false`.
    #[tracing::instrument(skip(self), name = "health_check")]
    pub async fn check_health(&self) -> bool {
        let url = self.config.endpoint(HEALTH_PATH);
        tracing::debug!(%url, "Checking backend health");

        let response = match self
            .client
            .get(&url)
            .header(ACCEPT, JSON)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Backend health check failed");
                return false;
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "Health check returned failure status");
            return false;
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(data) => {
                tracing::debug!(%data, "Health check response");
                true
            }
            Err(_) => {
                tracing::debug!(status = status.as_u16(), "Non-JSON health check response");
                status == StatusCode::OK
            }
        }
    }
}

impl AnalysisExecutor for AnalysisClient {
    fn execute<'a>(&'a self, content: &'a str) -> BoxFuture<'a, Result<AnalysisResult, AnalysisError>> {
        Box::pin(Self::execute(self, content))
    }
}

/// Build the error for a non-success response
///
/// Prefers `detail`, then `message`, then the whole JSON body; a body that is
/// not JSON (or is `null`) yields `HTTP {code}: {reason}`.
fn server_error(status: StatusCode, body: &str) -> AnalysisError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|data| error_message(&data))
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string()
        });

    AnalysisError::server(status.as_u16(), message)
}

fn error_message(data: &Value) -> Option<String> {
    if data.is_null() {
        return None;
    }

    ["detail", "message"]
        .iter()
        .filter_map(|key| data.get(key))
        .find(|value| is_truthy(value))
        .map_or_else(|| Some(data.to_string()), |value| Some(render(value)))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_result(body: &str) -> Result<AnalysisResult, AnalysisError> {
    match serde_json::from_str::<Value>(body) {
        Ok(data @ Value::Object(_)) => serde_json::from_value(data).map_err(|e| {
            tracing::error!(error = %e, "Analysis response does not match the expected shape");
            AnalysisError::invalid_response()
        }),
        Ok(_) | Err(_) => {
            tracing::error!("Analysis response is not a JSON object");
            Err(AnalysisError::invalid_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;
    use dymis_core::ErrorKind;

    #[test]
    fn test_client_creation() {
        let client = AnalysisClient::new(
            ClientConfig::new("http://localhost:8000").with_api_key("test-key"),
        )
        .unwrap();
        assert_eq!(client.config().api_key.as_deref(), Some("test-key"));
        assert_eq!(
            client.config().endpoint(ANALYZE_PATH),
            "http://localhost:8000/api/v1/analyze"
        );
    }

    #[test]
    fn test_strict_client_requires_key() {
        let err = AnalysisClient::new(ClientConfig::default().strict(true)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_server_error_prefers_detail() {
        let err = server_error(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"detail":"overloaded","message":"ignored"}"#,
        );
        assert_eq!(err.message(), "overloaded");
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_server_error_falls_back_to_message_then_body() {
        let err = server_error(StatusCode::BAD_REQUEST, r#"{"detail":"","message":"bad"}"#);
        assert_eq!(err.message(), "bad");

        let err = server_error(StatusCode::BAD_REQUEST, r#"{"error_code":"X"}"#);
        assert_eq!(err.message(), r#"{"error_code":"X"}"#);
    }

    #[test]
    fn test_server_error_structured_detail() {
        let err = server_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","content"]}]}"#,
        );
        assert_eq!(err.message(), r#"[{"loc":["body","content"]}]"#);
    }

    #[test]
    fn test_server_error_without_json() {
        let err = server_error(StatusCode::BAD_GATEWAY, "<html>upstream</html>");
        assert_eq!(err.message(), "HTTP 502: Bad Gateway");

        let err = server_error(StatusCode::INTERNAL_SERVER_ERROR, "null");
        assert_eq!(err.message(), "HTTP 500: Internal Server Error");
    }

    #[test]
    fn test_parse_result_requires_object() {
        for body in ["not-json", "", "[]", "42", "null", r#""text""#] {
            let err = parse_result(body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidResponse, "body: {body}");
            assert_eq!(err.message(), "Invalid response format from server");
        }
    }

    #[test]
    fn test_parse_result_rejects_wrongly_typed_fields() {
        let err = parse_result(r#"{"trust_score":"high"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }
}
