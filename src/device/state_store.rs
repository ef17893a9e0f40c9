//! Last-known capability state per device.
//!
//! Keeps whatever the driver last emitted for each device so the binary can
//! report it, and bumps a version counter whenever a value actually changes.

use super::{CapabilityEvent, Device, StateSink, SwitchState};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Snapshot of one device's hub-visible state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub battery: Option<u8>,
    pub online: Option<bool>,
    pub switch: Option<SwitchState>,
    /// Incremented each time one of the values above changes.
    pub version: u32,
}

impl DeviceState {
    /// Apply an event. Returns true if it changed the state.
    fn apply(&mut self, event: CapabilityEvent) -> bool {
        let changed = match event {
            CapabilityEvent::Battery(pct) => self.battery.replace(pct) != Some(pct),
            CapabilityEvent::Online => self.online.replace(true) != Some(true),
            CapabilityEvent::Offline => self.online.replace(false) != Some(false),
            CapabilityEvent::Switch(state) => self.switch.replace(state) != Some(state),
        };
        if changed {
            self.version = self.version.wrapping_add(1);
        }
        changed
    }
}

/// Thread-safe store of [`DeviceState`] keyed by network id.
#[derive(Default)]
pub struct DeviceStateStore {
    devices: RwLock<HashMap<String, DeviceState>>,
}

impl DeviceStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a device, if anything was ever emitted for it.
    pub fn get(&self, network_id: &str) -> Option<DeviceState> {
        self.devices.read().get(network_id).cloned()
    }

    /// Forget a device after teardown.
    pub fn remove(&self, network_id: &str) -> Option<DeviceState> {
        self.devices.write().remove(network_id)
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl StateSink for DeviceStateStore {
    fn emit(&self, device: &Device, event: CapabilityEvent) {
        let changed = self
            .devices
            .write()
            .entry(device.network_id.clone())
            .or_default()
            .apply(event);

        if changed {
            info!("[Hub] {} -> {}", device.label, event);
        } else {
            debug!("[Hub] {} unchanged: {}", device.label, event);
        }
    }
}
