// Persistent client state: the session token and the last username.
//
// The state file is a flat JSON object of string keys, one per profile:
// `<state_dir>/<profile>/state.json`. It is plain text at rest, written
// with owner-only permissions on Unix. Tokens can live in the system
// keyring instead; the username always stays in the file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hubctl_api::{TOKEN_KEY, TokenStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ConfigError, KEYRING_SERVICE};

const USERNAME_KEY: &str = "username";

/// Backing store for session tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    /// `state.json` in the state directory.
    #[default]
    File,
    /// System keyring, entry `hubctl/<profile>/token`.
    Keyring,
}

/// Path of the state file for `profile` under `state_dir`.
pub fn state_file_for(state_dir: &Path, profile: &str) -> PathBuf {
    state_dir.join(profile).join("state.json")
}

// ── State file ───────────────────────────────────────────────────────

/// A small JSON key-value file.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.read()?.remove(key))
    }

    /// Write `key`. A corrupt file is replaced rather than repaired.
    pub fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut entries = self.read_for_update()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write(&entries)
    }

    /// Remove `key`. Succeeds when the key or the file is absent, and
    /// resets a corrupt file.
    pub fn remove(&self, key: &str) -> Result<(), ConfigError> {
        match self.read() {
            Ok(mut entries) => {
                if entries.remove(key).is_some() {
                    self.write(&entries)?;
                }
                Ok(())
            }
            Err(ConfigError::State { .. }) => self.write(&BTreeMap::new()),
            Err(e) => Err(e),
        }
    }

    /// The username of the last successful login, if remembered.
    pub fn remembered_username(&self) -> Result<Option<String>, ConfigError> {
        self.get(USERNAME_KEY)
    }

    pub fn remember_username(&self, username: &str) -> Result<(), ConfigError> {
        self.set(USERNAME_KEY, username)
    }

    pub fn forget_username(&self) -> Result<(), ConfigError> {
        self.remove(USERNAME_KEY)
    }

    fn read(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| ConfigError::State {
            path: self.path.clone(),
            source,
        })
    }

    fn read_for_update(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        match self.read() {
            Err(e @ ConfigError::State { .. }) => {
                warn!(error = %e, "discarding corrupt state file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(entries).map_err(|source| ConfigError::State {
            path: self.path.clone(),
            source,
        })?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(&json)?;
        debug!(path = %self.path.display(), keys = entries.len(), "state file written");
        Ok(())
    }
}

// ── Token stores ─────────────────────────────────────────────────────

/// Token persisted under the `token` key of a [`StateFile`].
#[derive(Debug, Clone)]
pub struct StateFileTokenStore {
    file: StateFile,
}

impl StateFileTokenStore {
    pub fn new(file: StateFile) -> Self {
        Self { file }
    }

    pub fn state_file(&self) -> &StateFile {
        &self.file
    }
}

impl TokenStore for StateFileTokenStore {
    /// An unreadable state file holds no usable token.
    fn load(&self) -> Result<Option<String>, hubctl_api::Error> {
        match self.file.get(TOKEN_KEY) {
            Err(e @ ConfigError::State { .. }) => {
                warn!(error = %e, "ignoring corrupt state file");
                Ok(None)
            }
            other => other.map_err(Into::into),
        }
    }

    fn save(&self, token: &str) -> Result<(), hubctl_api::Error> {
        Ok(self.file.set(TOKEN_KEY, token)?)
    }

    fn clear(&self) -> Result<(), hubctl_api::Error> {
        Ok(self.file.remove(TOKEN_KEY)?)
    }
}

/// Token persisted in the system keyring.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    profile: String,
}

impl KeyringTokenStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, hubctl_api::Error> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}/{TOKEN_KEY}", self.profile))
            .map_err(keyring_error)
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>, hubctl_api::Error> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_error(e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), hubctl_api::Error> {
        self.entry()?.set_password(token).map_err(keyring_error)
    }

    fn clear(&self) -> Result<(), hubctl_api::Error> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_error(e)),
        }
    }
}

fn keyring_error(err: keyring::Error) -> hubctl_api::Error {
    hubctl_api::Error::Storage(format!("keyring: {err}"))
}

/// Build the token store for `profile`.
pub fn token_store_for(kind: TokenStoreKind, profile: &str, state_dir: &Path) -> Arc<dyn TokenStore> {
    match kind {
        TokenStoreKind::File => Arc::new(StateFileTokenStore::new(StateFile::new(state_file_for(
            state_dir, profile,
        )))),
        TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new(profile)),
    }
}
