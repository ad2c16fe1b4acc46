// Session store: the bearer token the client attaches to every request.
//
// The token is cached in memory and written through to a `TokenStore`
// so it survives process restarts. Nothing here talks to the network
// and nothing validates the token -- it is opaque until a request fails.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::Error;

/// Fixed key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Durable storage for the bearer token.
///
/// Implementations are synchronous and cheap; they are called on login,
/// logout, and once at [`Session::restore`].
pub trait TokenStore: Send + Sync {
    /// Return the persisted token, if any.
    fn load(&self) -> Result<Option<String>, Error>;

    /// Persist `token`, replacing whatever was stored before.
    fn save(&self, token: &str) -> Result<(), Error>;

    /// Erase the persisted token. Must succeed when nothing is stored.
    fn clear(&self) -> Result<(), Error>;
}

/// In-process token store. Nothing survives the process, but clones share
/// the same slot, which is enough to model "a fresh client reads the same
/// token" in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, Error> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<(), Error> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// The client's view of the current session.
///
/// Construct with [`Session::restore`], which performs the one-time read
/// from persistent storage. After that, reads are served from memory and
/// writes go through to the store.
pub struct Session {
    store: Arc<dyn TokenStore>,
    token: RwLock<Option<SecretString>>,
}

impl Session {
    /// Initialize a session from persisted storage.
    ///
    /// An empty persisted string counts as "no token".
    pub fn restore(store: Arc<dyn TokenStore>) -> Result<Self, Error> {
        let token = store
            .load()?
            .filter(|t| !t.is_empty())
            .map(SecretString::from);
        debug!(authenticated = token.is_some(), "session restored");
        Ok(Self {
            store,
            token: RwLock::new(token),
        })
    }

    /// The current bearer token, if any.
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist `token` and make it visible to all subsequent requests.
    ///
    /// Unconditionally overwrites any previous token.
    pub fn set_token(&self, token: &SecretString) -> Result<(), Error> {
        self.store.save(token.expose_secret())?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        debug!("session token stored");
        Ok(())
    }

    /// Forget the token, in memory and on disk.
    ///
    /// The in-memory token is dropped even if the store fails, so the
    /// session reports unauthenticated either way.
    pub fn clear_token(&self) -> Result<(), Error> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.store.clear()?;
        debug!("session token cleared");
        Ok(())
    }

    /// `true` iff a token is present. No validity check: a stale or
    /// server-rejected token still reports `true`.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn restore_from_empty_store_is_unauthenticated() {
        let session = Session::restore(Arc::new(MemoryTokenStore::new())).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn restore_reads_persisted_token() {
        let store = MemoryTokenStore::with_token("abc");
        let session = Session::restore(Arc::new(store)).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().unwrap().expose_secret(), "abc");
    }

    #[test]
    fn empty_persisted_token_counts_as_absent() {
        let store = MemoryTokenStore::with_token("");
        let session = Session::restore(Arc::new(store)).unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn set_token_writes_through() {
        let store = MemoryTokenStore::new();
        let session = Session::restore(Arc::new(store.clone())).unwrap();

        session.set_token(&secret("first")).unwrap();
        session.set_token(&secret("second")).unwrap();

        assert_eq!(store.load().unwrap().as_deref(), Some("second"));
        let fresh = Session::restore(Arc::new(store)).unwrap();
        assert_eq!(fresh.token().unwrap().expose_secret(), "second");
    }

    #[test]
    fn clear_token_is_idempotent() {
        let store = MemoryTokenStore::new();
        let session = Session::restore(Arc::new(store.clone())).unwrap();

        session.clear_token().unwrap();
        assert!(!session.is_authenticated());

        session.set_token(&secret("t")).unwrap();
        session.clear_token().unwrap();
        assert!(!session.is_authenticated());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let session = Session::restore(Arc::new(MemoryTokenStore::with_token("s3cr3t"))).unwrap();
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("authenticated: true"));
    }
}
