use thiserror::Error;

/// Top-level error type for the `hubctl-api` crate.
///
/// Every failure carries a single human-readable message. The backend
/// protocol guarantees nothing beyond that string, so callers should
/// display it rather than branch on its content. `hubctl-core` maps
/// these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The login endpoint rejected the credentials (or failed outright).
    #[error("{message}")]
    Auth { message: String },

    // ── Backend ─────────────────────────────────────────────────────
    /// Any other non-2xx response. `message` is server-supplied when the
    /// body carried one, otherwise a static fallback.
    #[error("{message}")]
    Request { message: String, status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Session storage ─────────────────────────────────────────────
    /// The persistent token store could not be read or written.
    #[error("Token storage error: {0}")]
    Storage(String),

    // ── WebSocket ───────────────────────────────────────────────────
    /// Device state WebSocket could not be opened or dropped with an error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures on the login path.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Returns `true` if the backend answered 401 or 403 to a bearer
    /// request, i.e. the stored token is stale or was never valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Request { status: 401 | 403, .. })
    }

    /// Returns `true` if this is a "not found" response.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Request { status, .. } => *status == 404,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if the request never produced an HTTP response.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::WebSocket(_) => true,
            _ => false,
        }
    }

    /// HTTP status of a rejected request, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
