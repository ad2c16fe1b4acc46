// ── Core error types ──
//
// Errors surfaced by hubctl-core. Consumers see one human-readable
// message per failure; the `From<hubctl_api::Error>` impl folds the
// transport taxonomy into these variants. Server-supplied messages pass
// through verbatim so they can be shown as-is.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Auth ─────────────────────────────────────────────────────────
    #[error("{message}")]
    AuthenticationFailed { message: String },

    // ── Backend ──────────────────────────────────────────────────────
    /// Non-2xx from the backend. `status` is `None` when the request
    /// failed at the HTTP layer without a usable status.
    #[error("{message}")]
    Request { message: String, status: Option<u16> },

    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Cannot reach hub at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    // ── Local state ──────────────────────────────────────────────────
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{message}")]
    InvalidState { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status of a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// Stored token rejected by the backend (401/403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hubctl_api::Error> for CoreError {
    fn from(err: hubctl_api::Error) -> Self {
        match err {
            hubctl_api::Error::Auth { message } => Self::AuthenticationFailed { message },
            hubctl_api::Error::Request { message, status } => Self::Request {
                message,
                status: Some(status),
            },
            hubctl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    Self::Timeout {
                        message: e.to_string(),
                    }
                } else if e.is_connect() {
                    Self::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    Self::Request {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            hubctl_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            hubctl_api::Error::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            hubctl_api::Error::WebSocket(reason) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket: {reason}"),
            },
            hubctl_api::Error::Storage(message) => Self::Storage { message },
            hubctl_api::Error::Deserialization { message, body: _ } => {
                Self::Internal(format!("Unexpected response from hub: {message}"))
            }
        }
    }
}
