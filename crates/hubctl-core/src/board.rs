// ── Device board ──
//
// The device list as last fetched from the server. Only ever replaced
// wholesale: there is no per-device patching, so what callers read is
// always exactly one server response.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use hubctl_api::{Device, DeviceState};
use serde::Serialize;

/// Dashboard counters over one board snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub total: usize,
    pub on: usize,
    pub off: usize,
}

impl DeviceSummary {
    pub fn from_devices(devices: &[Device]) -> Self {
        let count = |state| devices.iter().filter(|d| d.state == state).count();
        Self {
            total: devices.len(),
            on: count(DeviceState::On),
            off: count(DeviceState::Off),
        }
    }
}

#[derive(Debug, Default)]
pub struct DeviceBoard {
    devices: ArcSwap<Vec<Device>>,
    last_refresh: ArcSwapOption<DateTime<Utc>>,
}

impl DeviceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly fetched list and stamp the refresh time.
    pub(crate) fn replace(&self, devices: Vec<Device>) -> Arc<Vec<Device>> {
        let devices = Arc::new(devices);
        self.devices.store(Arc::clone(&devices));
        self.last_refresh.store(Some(Arc::new(Utc::now())));
        devices
    }

    pub(crate) fn clear(&self) {
        self.devices.store(Arc::new(Vec::new()));
        self.last_refresh.store(None);
    }

    pub fn snapshot(&self) -> Arc<Vec<Device>> {
        self.devices.load_full()
    }

    pub fn get(&self, device_id: &str) -> Option<Device> {
        self.devices
            .load()
            .iter()
            .find(|d| d.device_id == device_id)
            .cloned()
    }

    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary::from_devices(&self.devices.load())
    }

    /// When the board was last replaced; `None` before the first load.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh.load().as_deref().copied()
    }
}
