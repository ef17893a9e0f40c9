//! Status payload to capability events.

use crate::bridge::StatusPayload;
use crate::config::BatteryCalibration;
use crate::device::{CapabilityEvent, Device, StateSink, SwitchState};

/// Convert a battery voltage into a clamped 0..=100 percentage.
///
/// `floor((v - empty) / (full - empty) * 100)`, clamped.
pub fn battery_percent(voltage: f64, calibration: &BatteryCalibration) -> u8 {
    let span = calibration.full_volts - calibration.empty_volts;
    let pct = ((voltage - calibration.empty_volts) / span * 100.0).floor();
    if pct.is_nan() {
        return 0;
    }
    pct.clamp(0.0, 100.0) as u8
}

/// Maps bridge status payloads onto hub capabilities.
#[derive(Debug, Clone, Default)]
pub struct StatusMapper {
    calibration: BatteryCalibration,
}

impl StatusMapper {
    pub fn new(calibration: BatteryCalibration) -> Self {
        Self { calibration }
    }

    /// Events for a payload, one per present field, in a fixed order:
    /// battery, connectivity, food-low.
    pub fn map(&self, payload: &StatusPayload) -> Vec<CapabilityEvent> {
        let mut events = Vec::with_capacity(3);

        if let Some(voltage) = payload.battery {
            events.push(CapabilityEvent::Battery(battery_percent(
                voltage,
                &self.calibration,
            )));
        }

        if let Some(connected) = payload.connected {
            events.push(if connected {
                CapabilityEvent::Online
            } else {
                CapabilityEvent::Offline
            });
        }

        // Presence alone turns the switch off; the value is not inspected.
        if payload.food_low.is_some() {
            events.push(CapabilityEvent::Switch(SwitchState::Off));
        }

        events
    }

    /// Map a payload and emit every resulting event. Returns what was emitted.
    pub fn apply(
        &self,
        device: &Device,
        payload: &StatusPayload,
        sink: &dyn StateSink,
    ) -> Vec<CapabilityEvent> {
        let events = self.map(payload);
        for event in &events {
            sink.emit(device, *event);
        }
        events
    }
}
