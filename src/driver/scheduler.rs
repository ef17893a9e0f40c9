//! Per-device task scheduling.
//!
//! Every deferred or recurring callback is registered under the network id of
//! the device it belongs to, so tearing a device down cancels all of its
//! pending work in one call.

use futures_util::future::BoxFuture;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Shortest period a recurring task runs at; tokio intervals reject zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A schedulable callback. Recurring tasks call it once per period.
pub type Task = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure into a [`Task`].
pub fn task<F, Fut>(f: F) -> Task
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(f()) })
}

pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`.
    fn schedule_once(&self, device_id: &str, delay: Duration, task: Task);

    /// Run `task` every `period`, first after one full period. A zero
    /// period is raised to one millisecond.
    fn schedule_recurring(&self, device_id: &str, period: Duration, task: Task);

    /// Cancel everything registered for a device. Returns how many tasks
    /// were still pending.
    fn cancel_device(&self, device_id: &str) -> usize;
}

/// [`Scheduler`] running tasks on the tokio runtime.
///
/// Must be used from within a runtime; scheduling spawns immediately.
#[derive(Default)]
pub struct TokioScheduler {
    registry: Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks still pending for a device.
    pub fn pending(&self, device_id: &str) -> usize {
        self.registry
            .lock()
            .get(device_id)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    fn register(&self, device_id: &str, handle: JoinHandle<()>) {
        let mut registry = self.registry.lock();
        let handles = registry.entry(device_id.to_string()).or_default();
        // Expired one-shots are dropped here rather than by the tasks themselves.
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, device_id: &str, delay: Duration, task: Task) {
        debug!("[Scheduler] {} one-shot in {:?}", device_id, delay);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task().await;
        });
        self.register(device_id, handle);
    }

    fn schedule_recurring(&self, device_id: &str, period: Duration, task: Task) {
        let period = period.max(MIN_PERIOD);
        debug!("[Scheduler] {} recurring every {:?}", device_id, period);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                task().await;
            }
        });
        self.register(device_id, handle);
    }

    fn cancel_device(&self, device_id: &str) -> usize {
        let Some(handles) = self.registry.lock().remove(device_id) else {
            return 0;
        };
        let mut cancelled = 0;
        for handle in handles {
            if !handle.is_finished() {
                cancelled += 1;
            }
            handle.abort();
        }
        debug!("[Scheduler] {} cancelled {} task(s)", device_id, cancelled);
        cancelled
    }
}
