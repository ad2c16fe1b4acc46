// ── Current user ──
//
// The backend has no "who am I" endpoint, so the user shown after a
// restart is inferred locally. The inference sits behind `UserResolver`
// so a verified lookup can replace it without touching the Hub.

use hubctl_api::Session;
use serde::Serialize;

/// Username used when a token exists but no name was remembered.
pub const PLACEHOLDER_USERNAME: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Decides who the current user is from session state alone.
pub trait UserResolver: Send + Sync {
    fn resolve(&self, session: &Session) -> Option<User>;
}

/// Trusts any stored token: if one exists, the user is the last
/// remembered username or [`PLACEHOLDER_USERNAME`]. The token is never
/// checked against the server.
#[derive(Debug, Clone, Default)]
pub struct TokenPresenceResolver {
    last_username: Option<String>,
}

impl TokenPresenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_username(last_username: Option<String>) -> Self {
        Self {
            last_username: last_username.filter(|u| !u.trim().is_empty()),
        }
    }
}

impl UserResolver for TokenPresenceResolver {
    fn resolve(&self, session: &Session) -> Option<User> {
        session.is_authenticated().then(|| {
            User::new(
                self.last_username
                    .as_deref()
                    .unwrap_or(PLACEHOLDER_USERNAME),
            )
        })
    }
}
