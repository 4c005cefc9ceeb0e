//! Error types for analysis requests

use thiserror::Error;

/// Message used when content is blank
pub const EMPTY_CONTENT_MESSAGE: &str = "Content cannot be empty";

/// Message used when a success response is not a JSON object
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response format from server";

/// Message used when a transport failure carries no text of its own
pub const TRANSPORT_FALLBACK_MESSAGE: &str =
    "Failed to analyze content. Please check your connection and try again.";

/// The four ways an analysis request can fail
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Blank input, rejected before any I/O
    Validation,
    /// No response was obtained (connect, DNS, timeout)
    Transport,
    /// A response was obtained with a non-success status
    Server,
    /// Success status but the body was not a JSON object
    InvalidResponse,
}

impl ErrorKind {
    /// Stable lowercase name, used as a log and metric label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Server => "server",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed analysis request
///
/// Displays as the human-readable message only, so it can be rendered
/// verbatim by a presentation layer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AnalysisError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl AnalysisError {
    /// Create an error of the given kind
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Validation error for blank content
    #[must_use]
    pub fn empty_content() -> Self {
        Self::new(ErrorKind::Validation, EMPTY_CONTENT_MESSAGE)
    }

    /// Transport error, falling back to a generic message when `message` is blank
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::new(ErrorKind::Transport, TRANSPORT_FALLBACK_MESSAGE)
        } else {
            Self::new(ErrorKind::Transport, message)
        }
    }

    /// Server error carrying the HTTP status it was derived from
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Server,
            message: message.into(),
            status: Some(status),
        }
    }

    /// Error for a success response with an unusable body
    #[must_use]
    pub fn invalid_response() -> Self {
        Self::new(ErrorKind::InvalidResponse, INVALID_RESPONSE_MESSAGE)
    }

    /// Which of the four failure kinds this is
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status for server errors
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Consume the error, keeping only the message
    #[must_use]
    pub fn into_message(self) -> String {
        self.message
    }
}
