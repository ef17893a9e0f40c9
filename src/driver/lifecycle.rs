//! Device lifecycle callbacks invoked by the hub runtime.

use super::handlers::{FeedOutcome, FeederDriver, log_bridge_failure};
use crate::device::{CapabilityEvent, Device, SwitchState};
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Commands the hub can send to a feeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum HubCommand {
    /// Poll the bridge now.
    Refresh,
    /// Switch "on", which dispenses food.
    On,
}

/// What handling a [`HubCommand`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Refreshed(Vec<CapabilityEvent>),
    Fed(FeedOutcome),
}

/// Entry point for the hub runtime's lifecycle and command callbacks.
pub struct DeviceLifecycle {
    driver: FeederDriver,
    /// Devices whose recurring poll is installed.
    active: Mutex<HashSet<String>>,
}

impl DeviceLifecycle {
    pub fn new(driver: FeederDriver) -> Self {
        Self {
            driver,
            active: Mutex::new(HashSet::new()),
        }
    }

    pub fn driver(&self) -> &FeederDriver {
        &self.driver
    }

    pub fn is_active(&self, device: &Device) -> bool {
        self.active.lock().contains(&device.network_id)
    }

    /// Reset the indicator, poll once, and install the recurring poll.
    ///
    /// A device that is already active keeps its existing poll, so `init`
    /// followed by `added` still leaves exactly one recurring task. The device
    /// is marked active before the first poll; a `removed` that lands while
    /// that poll is in flight wins and no recurring task is installed.
    pub async fn init(&self, device: &Device) {
        info!("[Hub] {} init", device.label);
        let newly_active = self.active.lock().insert(device.network_id.clone());

        self.driver
            .sink()
            .emit(device, CapabilityEvent::Switch(SwitchState::Off));

        self.driver.refresh(device).await;

        if !newly_active {
            debug!("[Hub] {} poll already installed", device.label);
            return;
        }
        if !self.is_active(device) {
            debug!("[Hub] {} removed during init, no poll installed", device.label);
            return;
        }
        let period = self.driver.config().poll_interval;
        self.driver.scheduler().schedule_recurring(
            &device.network_id,
            period,
            self.driver.refresh_task(device),
        );
        info!("[Hub] {} polling every {:?}", device.label, period);
    }

    pub async fn added(&self, device: &Device) {
        self.init(device).await;
    }

    /// Check the bridge can reach the feeder. Marks it online on success.
    ///
    /// No retry here; the runtime decides whether to try again.
    pub async fn do_configure(&self, device: &Device) -> bool {
        match self.driver.client().fetch_status(device).await {
            Ok(_) => {
                info!("[Hub] {} configured", device.label);
                self.driver.sink().emit(device, CapabilityEvent::Online);
                true
            }
            Err(e) => {
                log_bridge_failure(device, "configure", &e);
                false
            }
        }
    }

    /// Tear a device down and cancel all of its scheduled work.
    pub fn removed(&self, device: &Device) {
        self.active.lock().remove(&device.network_id);
        let cancelled = self.driver.scheduler().cancel_device(&device.network_id);
        info!(
            "[Hub] {} removed, cancelled {} task(s)",
            device.label, cancelled
        );
    }

    pub async fn handle_command(&self, device: &Device, command: HubCommand) -> CommandOutcome {
        debug!("[Hub] {} command: {}", device.label, command);
        match command {
            HubCommand::Refresh => CommandOutcome::Refreshed(self.driver.refresh(device).await),
            HubCommand::On => CommandOutcome::Fed(self.driver.feed(device).await),
        }
    }
}
