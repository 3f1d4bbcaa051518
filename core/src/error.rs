//! Error types for the items API client.
//!
//! # Design
//! Every non-2xx response collapses into `ApiError::Http`, whose display
//! text is the message derived from the response body by
//! [`error_message`]. Callers that need the status code can still match on
//! it. The remaining variants cover failures that never produced a usable
//! response: the request could not be executed, or a body could not be
//! encoded or decoded.

use serde_json::Value;

/// Errors returned by the transport and data-access layers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("request failed: {0}")]
    Network(String),

    /// A 2xx response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Derive a human-readable message from an error response body.
///
/// Priority: the `detail` string, then the `message` string, then the whole
/// JSON document re-serialized. Empty strings count as absent. Bodies that
/// are not JSON fall back to their trimmed text, or `HTTP <status>` when
/// there is nothing to show.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ["detail", "message"]
            .iter()
            .filter_map(|field| value.get(field).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                format!("HTTP {status}")
            } else {
                text.to_string()
            }
        }
    }
}
