// Wire types for the hub backend.
//
// Field names follow the backend's JSON exactly (snake_case, Mongo-style
// `_id`). Response types are lenient: unknown fields are ignored and
// optional fields default, so a backend adding data never breaks a list.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Name the backend stores when a device is registered without one.
pub const UNNAMED_DEVICE: &str = "Unnamed Device";

// ── Auth ────────────────────────────────────────────────────────────

/// Credentials for `/register` (JSON) and `/login` (form-encoded).
#[derive(Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response body of a successful `/login`.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".into()
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

// ── Devices ─────────────────────────────────────────────────────────

/// Binary device state as the backend spells it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum DeviceState {
    #[serde(rename = "ON")]
    #[strum(serialize = "ON")]
    On,
    #[serde(rename = "OFF")]
    #[strum(serialize = "OFF")]
    Off,
    /// Anything else the backend stored. Never sent.
    #[serde(other)]
    #[strum(serialize = "UNKNOWN")]
    Unknown,
}

impl DeviceState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// The opposite state; `Unknown` flips to `On`.
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off | Self::Unknown => Self::On,
        }
    }
}

/// A device as listed by `GET /devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Server-side record identity.
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// External identity, used in API paths and MQTT topics.
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: String,
    pub state: DeviceState,
}

impl Device {
    /// Display name, falling back to the backend's placeholder.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNNAMED_DEVICE)
    }
}

/// Client-supplied-ID onboarding request: `{id, name}`.
///
/// Typically the `id` comes from scanning the label on the physical device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl DeviceRegistration {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// The body actually sent: both fields trimmed, blank names replaced
    /// by [`UNNAMED_DEVICE`].
    pub(crate) fn normalized(&self) -> Self {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNNAMED_DEVICE);
        Self {
            id: self.id.trim().to_owned(),
            name: Some(name.to_owned()),
        }
    }
}

/// Server-generated-ID onboarding request: `{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
}

impl NewDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The backend's acknowledgment of a newly registered device.
///
/// Both onboarding paths answer with `device_id` and `topic`; what else
/// arrives depends on who chose the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCreationResult {
    pub device_id: String,
    pub topic: String,
    #[serde(flatten)]
    pub kind: CreationKind,
}

/// Variant payload of a [`DeviceCreationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreationKind {
    /// Server minted the ID and returned provisioning material: a QR code
    /// image as a `data:` URI.
    Provisioned { qr: String },
    /// Client supplied the ID; the server only confirms.
    Acknowledged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl DeviceCreationResult {
    /// The provisioning QR data URI, present only on the server-generated path.
    pub fn qr(&self) -> Option<&str> {
        match &self.kind {
            CreationKind::Provisioned { qr } => Some(qr),
            CreationKind::Acknowledged { .. } => None,
        }
    }

    /// The server's confirmation message, if it sent one.
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            CreationKind::Acknowledged { message } => message.as_deref(),
            CreationKind::Provisioned { .. } => None,
        }
    }
}

/// Body of `POST /device/{device_id}/toggle`.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct ToggleRequest {
    pub state: DeviceState,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn device_deserializes_mongo_shape() {
        let device: Device = serde_json::from_value(json!({
            "_id": "665f1c",
            "device_id": "dev-1",
            "name": "Lamp",
            "owner": "alice",
            "state": "ON"
        }))
        .unwrap();

        assert_eq!(device.id.as_deref(), Some("665f1c"));
        assert_eq!(device.device_id, "dev-1");
        assert_eq!(device.display_name(), "Lamp");
        assert_eq!(device.state, DeviceState::On);
    }

    #[test]
    fn device_tolerates_missing_id_and_odd_state() {
        let device: Device = serde_json::from_value(json!({
            "device_id": "dev-2",
            "owner": "bob",
            "state": "BLINKING"
        }))
        .unwrap();

        assert!(device.id.is_none());
        assert_eq!(device.state, DeviceState::Unknown);
        assert_eq!(device.display_name(), UNNAMED_DEVICE);
    }

    #[test]
    fn state_parses_case_insensitively() {
        assert_eq!(DeviceState::from_str("on").unwrap(), DeviceState::On);
        assert_eq!(DeviceState::from_str("OFF").unwrap(), DeviceState::Off);
        assert!(DeviceState::from_str("maybe").is_err());
        assert_eq!(DeviceState::On.to_string(), "ON");
    }

    #[test]
    fn toggled_flips_state() {
        assert_eq!(DeviceState::On.toggled(), DeviceState::Off);
        assert_eq!(DeviceState::Off.toggled(), DeviceState::On);
        assert_eq!(DeviceState::Unknown.toggled(), DeviceState::On);
    }

    #[test]
    fn registration_normalizes_blank_name() {
        let reg = DeviceRegistration::new("  dev-123 ", Some("   ".into()));
        assert_eq!(
            reg.normalized(),
            DeviceRegistration::new("dev-123", Some(UNNAMED_DEVICE.into()))
        );

        let reg = DeviceRegistration::new("dev-123", Some("  Porch light ".into()));
        assert_eq!(reg.normalized().name.as_deref(), Some("Porch light"));
    }

    #[test]
    fn creation_result_variants() {
        let registered: DeviceCreationResult = serde_json::from_value(json!({
            "message": "Device registered",
            "device_id": "dev-1",
            "topic": "home/devices/dev-1/set"
        }))
        .unwrap();
        assert_eq!(registered.message(), Some("Device registered"));
        assert!(registered.qr().is_none());

        let provisioned: DeviceCreationResult = serde_json::from_value(json!({
            "device_id": "a1b2",
            "topic": "home/devices/a1b2/set",
            "qr": "data:image/png;base64,AAAA"
        }))
        .unwrap();
        assert_eq!(provisioned.qr(), Some("data:image/png;base64,AAAA"));
        assert!(provisioned.message().is_none());
    }

    #[test]
    fn login_response_debug_is_redacted() {
        let resp = LoginResponse {
            access_token: "eyJhbGciOi".into(),
            token_type: "bearer".into(),
        };
        let rendered = format!("{resp:?}");
        assert!(!rendered.contains("eyJhbGciOi"));
        assert!(rendered.contains("bearer"));
    }

    #[test]
    fn device_serializes_for_output() {
        let device = Device {
            id: Some("1".into()),
            device_id: "dev-1".into(),
            name: Some("Lamp".into()),
            owner: "alice".into(),
            state: DeviceState::Off,
        };
        insta::assert_json_snapshot!(device, @r###"
        {
          "_id": "1",
          "device_id": "dev-1",
          "name": "Lamp",
          "owner": "alice",
          "state": "OFF"
        }
        "###);
    }
}
