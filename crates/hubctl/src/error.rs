//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use hubctl_config::ConfigError;
use hubctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the hub at {url}")]
    #[diagnostic(
        code(hubctl::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}\n\
             Override the URL with --api-url or: hubctl config set profiles.<name>.api_url <url>"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("{message}")]
    #[diagnostic(
        code(hubctl::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(hubctl::auth_failed), help("Check your username and password."))]
    AuthFailed { message: String },

    #[error("Not logged in")]
    #[diagnostic(code(hubctl::not_logged_in), help("Run: hubctl login"))]
    NotLoggedIn,

    #[error("Session rejected by the backend: {message}")]
    #[diagnostic(
        code(hubctl::session_rejected),
        help("The stored token is no longer accepted. Run: hubctl login")
    )]
    SessionRejected { message: String },

    #[error("No username available for profile '{profile}'")]
    #[diagnostic(
        code(hubctl::no_credentials),
        help(
            "Pass --username, set HUBCTL_USERNAME, or configure one with:\n\
             hubctl config set profiles.{profile}.username <name>"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(hubctl::not_found),
        help("Run: hubctl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(hubctl::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hubctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration & state ────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(hubctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: hubctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{message}")]
    #[diagnostic(code(hubctl::config), help("Inspect it with: hubctl config show"))]
    Config { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(hubctl::state),
        help("Check the path and its permissions. A corrupt state file can be deleted to start over.")
    )]
    Storage { message: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(hubctl::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(hubctl::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. }
            | Self::NotLoggedIn
            | Self::SessionRejected { .. }
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. }
            | Self::Api {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub(crate) fn prompt(err: impl std::fmt::Display) -> Self {
        Self::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {err}"),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Request {
                message,
                status: Some(401),
            } => CliError::SessionRejected { message },

            CoreError::Request { message, status } => CliError::Api { message, status },

            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::Timeout { message } => CliError::Timeout { message },

            CoreError::Validation { field, message } => CliError::Validation {
                field,
                reason: message,
            },

            CoreError::InvalidState { message } => CliError::Validation {
                field: "state".into(),
                reason: message,
            },

            CoreError::Storage { message } => CliError::Storage { message },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Api {
                message,
                status: None,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            e @ (ConfigError::State { .. } | ConfigError::Keyring(_)) => CliError::Storage {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let cases = [
            (
                CliError::from(CoreError::AuthenticationFailed {
                    message: "bad credentials".into(),
                }),
                exit_code::AUTH,
            ),
            (
                CliError::from(CoreError::Request {
                    message: "expired".into(),
                    status: Some(401),
                }),
                exit_code::AUTH,
            ),
            (
                CliError::from(CoreError::Request {
                    message: "Device not found".into(),
                    status: Some(404),
                }),
                exit_code::NOT_FOUND,
            ),
            (
                CliError::from(CoreError::ConnectionFailed {
                    url: "http://localhost:8000".into(),
                    reason: "refused".into(),
                }),
                exit_code::CONNECTION,
            ),
            (
                CliError::from(CoreError::Timeout {
                    message: "timed out".into(),
                }),
                exit_code::TIMEOUT,
            ),
            (
                CliError::from(CoreError::Validation {
                    field: "id".into(),
                    message: "Device ID is required".into(),
                }),
                exit_code::USAGE,
            ),
            (
                CliError::from(CoreError::Request {
                    message: "boom".into(),
                    status: Some(500),
                }),
                exit_code::GENERAL,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err:?}");
        }
    }

    #[test]
    fn backend_detail_is_the_headline() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            message: "bad credentials".into(),
        });
        assert_eq!(err.to_string(), "bad credentials");
    }

    #[test]
    fn unknown_profile_is_a_usage_error() {
        let err = CliError::from(ConfigError::UnknownProfile { name: "lab".into() });
        assert!(matches!(err, CliError::ProfileNotFound { ref name, .. } if name == "lab"));
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
