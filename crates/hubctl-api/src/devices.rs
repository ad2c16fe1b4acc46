// Device endpoints
//
// All require a bearer token. None of them touch local state: the
// caller re-lists devices to observe the effect of a mutation.

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::HubClient;
use crate::error::Error;
use crate::models::{Device, DeviceCreationResult, DeviceRegistration, DeviceState, NewDevice, ToggleRequest};

impl HubClient {
    /// List the caller's devices in server order.
    ///
    /// Order is whatever the backend returns; it is not guaranteed to be
    /// stable between calls.
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.url_for(&["devices"])?;
        let devices: Option<Vec<Device>> = self.send::<_, ()>(Method::GET, url, None).await?;
        let devices = devices.unwrap_or_default();
        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Register a device whose ID the caller already knows (typed in or
    /// scanned from its label).
    ///
    /// The ID and name are trimmed; a blank name is sent as
    /// [`UNNAMED_DEVICE`](crate::models::UNNAMED_DEVICE).
    pub async fn register_device(
        &self,
        registration: &DeviceRegistration,
    ) -> Result<DeviceCreationResult, Error> {
        let body = registration.normalized();
        let url = self.url_for(&["device"])?;
        let result: DeviceCreationResult = self.send(Method::POST, url, Some(&body)).await?;
        info!(device_id = %result.device_id, "device registered");
        Ok(result)
    }

    /// Register a device and let the backend mint its ID.
    ///
    /// The result carries the provisioning QR (a `data:` URI). It is a
    /// one-time artifact: nothing re-issues it later.
    pub async fn add_device(&self, device: &NewDevice) -> Result<DeviceCreationResult, Error> {
        let url = self.url_for(&["device"])?;
        let result: DeviceCreationResult = self.send(Method::POST, url, Some(device)).await?;
        info!(device_id = %result.device_id, "device provisioned");
        Ok(result)
    }

    /// Ask the backend to switch a device ON or OFF.
    ///
    /// The backend is authoritative; the returned acknowledgment is passed
    /// through untouched.
    pub async fn toggle_device(&self, device_id: &str, state: DeviceState) -> Result<Value, Error> {
        let url = self.url_for(&["device", device_id, "toggle"])?;
        let ack: Value = self
            .send(Method::POST, url, Some(&ToggleRequest { state }))
            .await?;
        info!(device_id, %state, "toggle requested");
        Ok(ack)
    }
}
