//! Shared configuration for hubctl.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! persistent token storage, and translation to `hubctl_core::HubConfig`.
//! The CLI adds flag-aware wrappers on top.

mod state;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hubctl_core::{DEFAULT_API_URL, HubConfig, TlsVerification};

pub use state::{
    KeyringTokenStore, StateFile, StateFileTokenStore, TokenStoreKind, state_file_for,
    token_store_for,
};

/// Keyring service name for every secret hubctl stores.
pub const KEYRING_SERVICE: &str = "hubctl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("state file {path} is corrupt: {source}")]
    State {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for hubctl_api::Error {
    fn from(err: ConfigError) -> Self {
        Self::Storage(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Where session tokens are persisted.
    #[serde(default)]
    pub token_store: TokenStoreKind,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            token_store: TokenStoreKind::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://hub.example.com/api").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Username to log in with.
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override where this profile's token is persisted.
    pub token_store: Option<TokenStoreKind>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            username: None,
            password: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            token_store: None,
        }
    }
}

impl Profile {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "hubctl", "hubctl")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Resolve the config file path: `HUBCTL_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("HUBCTL_CONFIG") {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || home_fallback(&[".config", "hubctl", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding per-profile state files.
pub fn state_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "hubctl"]),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// Environment overrides use `HUBCTL_` with `__` as the nesting
/// separator, e.g. `HUBCTL_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HUBCTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Set a dotted key (`defaults.output`, `profiles.home.api_url`, ...)
/// and return the updated config. The value is taken as a string when
/// the target accepts one, otherwise as a bool or integer.
pub fn set_key(cfg: &Config, key: &str, value: &str) -> Result<Config, ConfigError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Validation {
            field: "key".into(),
            reason: format!("malformed key '{key}'"),
        });
    }

    let mut candidates = vec![toml::Value::String(value.to_owned())];
    if let Ok(b) = value.parse::<bool>() {
        candidates.push(toml::Value::Boolean(b));
    }
    if let Ok(n) = value.parse::<i64>() {
        candidates.push(toml::Value::Integer(n));
    }

    let base = toml::Value::try_from(cfg)?;
    let mut last_err = None;
    for candidate in candidates {
        let mut tree = base.clone();
        insert_path(&mut tree, &segments, candidate)?;
        match tree.try_into::<Config>() {
            Ok(updated) => return Ok(updated),
            Err(e) => last_err = Some(e),
        }
    }

    Err(ConfigError::Validation {
        field: key.into(),
        reason: last_err.map_or_else(|| "rejected".into(), |e| e.message().to_owned()),
    })
}

fn insert_path(
    tree: &mut toml::Value,
    segments: &[&str],
    value: toml::Value,
) -> Result<(), ConfigError> {
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };
    let mut node = tree;
    for segment in parents {
        let table = node.as_table_mut().ok_or_else(|| ConfigError::Validation {
            field: (*segment).into(),
            reason: "not a table".into(),
        })?;
        node = table
            .entry((*segment).to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    let table = node.as_table_mut().ok_or_else(|| ConfigError::Validation {
        field: (*last).into(),
        reason: "parent is not a table".into(),
    })?;
    table.insert((*last).to_owned(), value);
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Resolve the active profile name from an explicit choice and config.
pub fn active_profile_name(explicit: Option<&str>, config: &Config) -> String {
    explicit
        .map(String::from)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Where the profile's token lives, falling back to the global default.
pub fn token_store_kind(profile: Option<&Profile>, config: &Config) -> TokenStoreKind {
    profile
        .and_then(|p| p.token_store)
        .unwrap_or(config.defaults.token_store)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Username from the profile, then `HUBCTL_USERNAME`.
pub fn resolve_username(profile: Option<&Profile>) -> Option<String> {
    profile
        .and_then(|p| p.username.clone())
        .or_else(|| std::env::var("HUBCTL_USERNAME").ok())
        .filter(|u| !u.trim().is_empty())
}

/// Password from `HUBCTL_PASSWORD`, the keyring, then plaintext config.
/// `None` means the caller should prompt.
pub fn resolve_password(profile: Option<&Profile>, profile_name: &str) -> Option<SecretString> {
    // 1. Env var
    if let Ok(pw) = std::env::var("HUBCTL_PASSWORD") {
        return Some(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    profile
        .and_then(|p| p.password.clone())
        .map(SecretString::from)
}

/// Store a profile password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?
        .set_password(password)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `HubConfig` from a profile, no CLI flag overrides.
pub fn profile_to_hub_config(profile: &Profile, defaults: &Defaults) -> Result<HubConfig, ConfigError> {
    let config = HubConfig::from_url_str(&profile.api_url).map_err(|e| ConfigError::Validation {
        field: "api_url".into(),
        reason: e.to_string(),
    })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(config.with_tls(tls).with_timeout(timeout))
}
