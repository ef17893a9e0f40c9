//! Hub command handlers: `refresh` and `feed`.

use super::mapper::StatusMapper;
use super::scheduler::{Scheduler, Task, task};
use crate::bridge::BridgeClient;
use crate::config::DriverConfig;
use crate::device::{CapabilityEvent, Device, StateSink, SwitchState};
use crate::error::BridgeError;
use log::{debug, info, warn};
use std::sync::Arc;

/// Result of a `feed` command as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Bridge confirmed; indicator and follow-ups are scheduled.
    Dispensed { portions: u32 },
    /// Bridge answered with a status other than `"success"`.
    Rejected { status: String },
    Failed(BridgeError),
}

impl FeedOutcome {
    pub fn is_dispensed(&self) -> bool {
        matches!(self, FeedOutcome::Dispensed { .. })
    }
}

struct DriverInner {
    client: BridgeClient,
    mapper: StatusMapper,
    sink: Arc<dyn StateSink>,
    scheduler: Arc<dyn Scheduler>,
    config: DriverConfig,
}

/// Translates hub commands into bridge calls and bridge answers into
/// capability events.
///
/// Cheap to clone; scheduled follow-ups hold their own clone.
#[derive(Clone)]
pub struct FeederDriver {
    inner: Arc<DriverInner>,
}

impl FeederDriver {
    pub fn new(
        client: BridgeClient,
        sink: Arc<dyn StateSink>,
        scheduler: Arc<dyn Scheduler>,
        config: DriverConfig,
    ) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                client,
                mapper: StatusMapper::new(config.battery),
                sink,
                scheduler,
                config,
            }),
        }
    }

    pub fn client(&self) -> &BridgeClient {
        &self.inner.client
    }

    pub fn config(&self) -> &DriverConfig {
        &self.inner.config
    }

    pub(crate) fn sink(&self) -> &dyn StateSink {
        self.inner.sink.as_ref()
    }

    pub(crate) fn scheduler(&self) -> &dyn Scheduler {
        self.inner.scheduler.as_ref()
    }

    /// Poll the bridge and map the answer onto capabilities.
    ///
    /// Failures are logged and swallowed; the device keeps its last state
    /// until a later poll succeeds. Returns the events emitted.
    pub async fn refresh(&self, device: &Device) -> Vec<CapabilityEvent> {
        match self.inner.client.fetch_status(device).await {
            Ok(payload) => {
                debug!(
                    "[Feeder] {} status: food_level={:?} adapter={:?} last_feed={:?}",
                    device.label, payload.food_level, payload.adapter_installed, payload.last_feed
                );
                self.inner
                    .mapper
                    .apply(device, &payload, self.inner.sink.as_ref())
            }
            Err(e) => {
                log_bridge_failure(device, "status poll", &e);
                Vec::new()
            }
        }
    }

    /// Dispense food and drive the transient "feeding" indicator.
    ///
    /// On success the switch goes on immediately, back off after the revert
    /// delay, and the device is refreshed after the follow-up delay. Calls
    /// that overlap are not merged; each schedules its own pair of tasks.
    pub async fn feed(&self, device: &Device) -> FeedOutcome {
        let portions = device.preferences.portions();

        let result = match self.inner.client.trigger_feed(device, portions).await {
            Ok(result) => result,
            Err(e) => {
                log_bridge_failure(device, "feed request", &e);
                return FeedOutcome::Failed(e);
            }
        };

        if !result.is_success() {
            warn!(
                "[Feeder] {} feed not confirmed by bridge: status={}",
                device.label, result.status
            );
            return FeedOutcome::Rejected {
                status: result.status,
            };
        }

        info!("[Feeder] {} dispensed {} portion(s)", device.label, portions);
        self.inner
            .sink
            .emit(device, CapabilityEvent::Switch(SwitchState::On));

        let sink = Arc::clone(&self.inner.sink);
        let revert_device = device.clone();
        self.inner.scheduler.schedule_once(
            &device.network_id,
            self.inner.config.indicator_revert_delay,
            task(move || {
                let sink = Arc::clone(&sink);
                let device = revert_device.clone();
                async move {
                    sink.emit(&device, CapabilityEvent::Switch(SwitchState::Off));
                }
            }),
        );

        self.inner.scheduler.schedule_once(
            &device.network_id,
            self.inner.config.follow_up_refresh_delay,
            self.refresh_task(device),
        );

        FeedOutcome::Dispensed { portions }
    }

    /// A schedulable task that refreshes `device`.
    pub(crate) fn refresh_task(&self, device: &Device) -> Task {
        let driver = self.clone();
        let device = device.clone();
        task(move || {
            let driver = driver.clone();
            let device = device.clone();
            async move {
                driver.refresh(&device).await;
            }
        })
    }
}

/// Log a bridge failure with the device label, target URL and status code.
pub(crate) fn log_bridge_failure(device: &Device, what: &str, err: &BridgeError) {
    let status = err
        .status_code()
        .map_or_else(|| "none".to_string(), |s| s.to_string());
    warn!(
        "[Bridge] {} {} failed: url={} status={} ({})",
        device.label,
        what,
        err.url(),
        status,
        err
    );
}
