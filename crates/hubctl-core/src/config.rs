// ── Runtime connection configuration ──
//
// Describes *how* to reach the hub backend. Never touches disk: the
// CLI (via hubctl-config) builds a `HubConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use hubctl_api::{TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;

/// Backend URL used when nothing else is configured.
///
/// Overridable at build time through `HUBCTL_DEFAULT_API_URL`.
pub const DEFAULT_API_URL: &str = match option_env!("HUBCTL_DEFAULT_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

/// Configuration for talking to one hub backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Backend base URL, possibly with a path prefix.
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl HubConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Parse `url` and build a config with default TLS and timeout.
    pub fn from_url_str(url: &str) -> Result<Self, CoreError> {
        let parsed = Url::parse(url.trim()).map_err(|e| CoreError::Config {
            message: format!("invalid hub URL '{url}': {e}"),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self::new(parsed)),
            other => Err(CoreError::Config {
                message: format!("hub URL must be http or https, got '{other}'"),
            }),
        }
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::default()
            .with_tls(tls)
            .with_timeout(self.timeout)
    }
}
