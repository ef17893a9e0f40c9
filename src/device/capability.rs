//! Capability events emitted towards the hub.

use super::Device;
use strum::Display;

/// Value of the on/off capability.
///
/// `On` is the transient "feeding in progress" indicator; everything else
/// reports `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SwitchState {
    On,
    Off,
}

/// A single state update for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityEvent {
    /// Battery level in percent, always within 0..=100.
    Battery(u8),
    /// Device-level connectivity came back.
    Online,
    /// Device-level connectivity was lost.
    Offline,
    Switch(SwitchState),
}

impl std::fmt::Display for CapabilityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityEvent::Battery(pct) => write!(f, "battery={pct}%"),
            CapabilityEvent::Online => write!(f, "online"),
            CapabilityEvent::Offline => write!(f, "offline"),
            CapabilityEvent::Switch(state) => write!(f, "switch={state}"),
        }
    }
}

/// Receiver of capability events; owns the final device state.
///
/// Events are append-only from the driver's point of view. Implementations
/// must be cheap and must not block, they are called from scheduled tasks.
pub trait StateSink: Send + Sync {
    fn emit(&self, device: &Device, event: CapabilityEvent);
}
