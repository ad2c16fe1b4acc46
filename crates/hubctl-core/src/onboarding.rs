// ── Device onboarding ──
//
// Two ways to put a device on the board. Either the caller knows the ID
// (typed in or scanned from the label) or the backend mints one and
// answers with a provisioning QR. Both go through the same submit path,
// produce the same result type and fail the same way.

use std::path::{Path, PathBuf};

use hubctl_api::{DeviceCreationResult, DeviceRegistration, HubClient, NewDevice};
use tracing::debug;

use crate::error::CoreError;
use crate::hub::Hub;
use crate::notify::Notification;
use crate::qr::ProvisioningQr;

// ── Strategy ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingStrategy {
    /// Register a device whose ID is already known.
    ClientSupplied { id: String, name: String },
    /// Let the backend choose the ID and return a provisioning QR.
    ServerGenerated { name: String },
}

impl OnboardingStrategy {
    pub fn client_supplied(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ClientSupplied {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn server_generated(name: impl Into<String>) -> Self {
        Self::ServerGenerated { name: name.into() }
    }

    /// The name as entered, before any normalization.
    pub fn name(&self) -> &str {
        match self {
            Self::ClientSupplied { name, .. } | Self::ServerGenerated { name } => name,
        }
    }

    /// Reject input the backend would never accept. Client-supplied IDs
    /// must be non-blank; server-generated devices need a name.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::ClientSupplied { id, .. } if id.trim().is_empty() => {
                Err(CoreError::validation("id", "device ID must not be empty"))
            }
            Self::ServerGenerated { name } if name.trim().is_empty() => {
                Err(CoreError::validation("name", "device name must not be empty"))
            }
            _ => Ok(()),
        }
    }

    pub(crate) async fn submit(&self, client: &HubClient) -> Result<DeviceCreationResult, CoreError> {
        self.validate()?;
        let result = match self {
            Self::ClientSupplied { id, name } => {
                client
                    .register_device(&DeviceRegistration::new(id.as_str(), Some(name.clone())))
                    .await?
            }
            Self::ServerGenerated { name } => {
                client.add_device(&NewDevice::new(name.trim())).await?
            }
        };
        Ok(result)
    }

    pub(crate) fn success_notification(&self) -> Notification {
        match self {
            Self::ClientSupplied { name, .. } => {
                let shown = if name.trim().is_empty() { "Device" } else { name.trim() };
                Notification::success(
                    "Device registered successfully!",
                    format!("{shown} has been added to your dashboard."),
                )
            }
            Self::ServerGenerated { name } => Notification::success(
                "Device added successfully!",
                format!("{} is ready to be configured.", name.trim()),
            ),
        }
    }

    pub(crate) fn failure_title(&self) -> &'static str {
        match self {
            Self::ClientSupplied { .. } => "Failed to register device",
            Self::ServerGenerated { .. } => "Failed to add device",
        }
    }
}

// ── Flow ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingState {
    Idle { name: String },
    Submitting { name: String },
    /// Server-generated device created; the QR is held until `close()`.
    Provisioned {
        device_id: String,
        topic: String,
        qr: String,
    },
}

/// The add-device dialog as a state machine.
///
/// `Idle -> Submitting -> Provisioned -> Idle`. A failed submit goes back
/// to `Idle` keeping the name; a client-supplied registration goes
/// straight back to a blank `Idle` since there is nothing to show.
#[derive(Debug)]
pub struct OnboardingFlow {
    state: OnboardingState,
}

impl Default for OnboardingFlow {
    fn default() -> Self {
        Self {
            state: OnboardingState::Idle {
                name: String::new(),
            },
        }
    }
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    /// Submit through `hub`, moving through `Submitting` to the outcome.
    pub async fn submit(
        &mut self,
        hub: &Hub,
        strategy: OnboardingStrategy,
    ) -> Result<DeviceCreationResult, CoreError> {
        if !matches!(self.state, OnboardingState::Idle { .. }) {
            return Err(CoreError::InvalidState {
                message: format!("cannot submit while {}", describe(&self.state)),
            });
        }

        let name = strategy.name().to_owned();
        self.state = OnboardingState::Submitting { name: name.clone() };

        match hub.onboard(&strategy).await {
            Ok(result) => {
                self.state = match result.qr() {
                    Some(qr) => OnboardingState::Provisioned {
                        device_id: result.device_id.clone(),
                        topic: result.topic.clone(),
                        qr: qr.to_owned(),
                    },
                    None => OnboardingState::Idle {
                        name: String::new(),
                    },
                };
                debug!(state = describe(&self.state), "onboarding submitted");
                Ok(result)
            }
            Err(e) => {
                self.state = OnboardingState::Idle { name };
                Err(e)
            }
        }
    }

    /// Decode the held QR. Only available while provisioned.
    pub fn provisioning_qr(&self) -> Result<ProvisioningQr, CoreError> {
        match &self.state {
            OnboardingState::Provisioned { qr, .. } => ProvisioningQr::parse(qr),
            other => Err(CoreError::InvalidState {
                message: format!("no provisioning QR while {}", describe(other)),
            }),
        }
    }

    /// Write the held QR to `target` (a file, or a directory that gets
    /// `<device_id>-qr-code.png`). Must happen before [`close`](Self::close).
    pub fn save_qr(&self, target: &Path) -> Result<PathBuf, CoreError> {
        match &self.state {
            OnboardingState::Provisioned { device_id, qr, .. } => {
                ProvisioningQr::parse(qr)?.save(target, device_id)
            }
            other => Err(CoreError::InvalidState {
                message: format!("no provisioning QR while {}", describe(other)),
            }),
        }
    }

    /// Dismiss the dialog, dropping every transient field including the QR.
    pub fn close(&mut self) {
        self.state = OnboardingState::Idle {
            name: String::new(),
        };
    }
}

fn describe(state: &OnboardingState) -> &'static str {
    match state {
        OnboardingState::Idle { .. } => "idle",
        OnboardingState::Submitting { .. } => "submitting",
        OnboardingState::Provisioned { .. } => "provisioned",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rules() {
        assert!(OnboardingStrategy::client_supplied("  ", "Lamp").validate().is_err());
        assert!(OnboardingStrategy::client_supplied("dev-1", "").validate().is_ok());
        assert!(OnboardingStrategy::server_generated(" ").validate().is_err());
        assert!(OnboardingStrategy::server_generated("Lamp").validate().is_ok());
    }

    #[test]
    fn success_copy() {
        let n = OnboardingStrategy::client_supplied("dev-1", "").success_notification();
        assert_eq!(n.description, "Device has been added to your dashboard.");

        let n = OnboardingStrategy::server_generated("Lamp").success_notification();
        assert_eq!(n.title, "Device added successfully!");
        assert_eq!(n.description, "Lamp is ready to be configured.");
    }

    #[test]
    fn close_drops_the_qr() {
        let mut flow = OnboardingFlow::new();
        flow.state = OnboardingState::Provisioned {
            device_id: "a1".into(),
            topic: "home/devices/a1/set".into(),
            qr: "data:image/png;base64,iVBORw0KGgo=".into(),
        };
        assert!(flow.provisioning_qr().is_ok());

        flow.close();
        assert_eq!(flow.state(), &OnboardingState::Idle { name: String::new() });
        assert!(matches!(flow.provisioning_qr(), Err(CoreError::InvalidState { .. })));
    }
}
