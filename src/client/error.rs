use std::{fmt, time::Duration};

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single logical API call.
///
/// Cloneable so one settled outcome can be handed to every caller attached to
/// a coalesced request.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("request timed out after {} ms", .budget.as_millis())]
    Timeout { budget: Duration },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server responded with status {status}: {}", .body.summary())]
    Status { status: StatusCode, body: ErrorBody },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of a non-2xx reply, if this error carries one.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Body of an error response: JSON when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
    Empty,
}

impl ErrorBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Human-readable detail: the JSON `detail` field when present, else the text.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Json(Value::Object(map)) => match map.get("detail") {
                Some(Value::String(detail)) => Some(detail.clone()),
                _ => None,
            },
            Self::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Self::Json(value) => self.detail().unwrap_or_else(|| value.to_string()),
            Self::Text(text) => text.clone(),
            Self::Empty => "<empty body>".to_string(),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_body_exposes_detail() {
        let body = ErrorBody::from_bytes(br#"{"detail":"Not found."}"#);
        assert_eq!(body.detail().as_deref(), Some("Not found."));
        assert_eq!(body.summary(), "Not found.");
    }

    #[test]
    fn field_errors_summarize_as_json() {
        let body = ErrorBody::from_bytes(br#"{"content":["This field may not be blank."]}"#);
        assert_eq!(
            body.as_json(),
            Some(&json!({"content": ["This field may not be blank."]}))
        );
        assert!(body.summary().contains("may not be blank"));
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        let body = ErrorBody::from_bytes(b"<html>Bad Gateway</html>");
        assert_eq!(body, ErrorBody::Text("<html>Bad Gateway</html>".into()));
    }

    #[test]
    fn blank_body_is_empty() {
        assert_eq!(ErrorBody::from_bytes(b"  \n"), ErrorBody::Empty);
    }

    #[test]
    fn status_error_message_carries_status_and_body() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::Text("nope".into()),
        };
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.to_string(),
            "server responded with status 400 Bad Request: nope"
        );
    }

    #[test]
    fn timeout_message_reports_budget() {
        let err = ApiError::Timeout {
            budget: Duration::from_millis(250),
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "request timed out after 250 ms");
    }
}
