//! Hub-side device model.
//!
//! The hub runtime owns device identity, preferences and addressing. The
//! driver only reads a [`Device`] and reports state changes about it through
//! a [`StateSink`].

pub mod capability;
pub mod state_store;

pub use capability::{CapabilityEvent, StateSink, SwitchState};
pub use state_store::{DeviceState, DeviceStateStore};

use serde::{Deserialize, Serialize};

/// Bridge address used when the device preferences leave it unset.
pub const DEFAULT_BRIDGE_HOST: &str = "127.0.0.1";

/// Bridge port used when the device preferences leave it unset.
pub const DEFAULT_BRIDGE_PORT: u16 = 5000;

/// Portions dispensed per feed when the device preferences leave it unset.
pub const DEFAULT_PORTIONS: u32 = 1;

/// Per-device preferences supplied by the hub runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePreferences {
    #[serde(default)]
    pub bridge_host: Option<String>,
    #[serde(default)]
    pub bridge_port: Option<u16>,
    #[serde(default)]
    pub portions: Option<u32>,
}

impl DevicePreferences {
    pub fn host(&self) -> &str {
        self.bridge_host
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_BRIDGE_HOST)
    }

    pub fn port(&self) -> u16 {
        self.bridge_port.unwrap_or(DEFAULT_BRIDGE_PORT)
    }

    pub fn portions(&self) -> u32 {
        self.portions.unwrap_or(DEFAULT_PORTIONS)
    }
}

/// A feeder as the hub runtime knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Network id, which is also the feeder's thing name on the bridge.
    pub network_id: String,
    pub label: String,
    #[serde(default)]
    pub preferences: DevicePreferences,
}

impl Device {
    pub fn new(network_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            network_id: network_id.into(),
            label: label.into(),
            preferences: DevicePreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: DevicePreferences) -> Self {
        self.preferences = preferences;
        self
    }
}
