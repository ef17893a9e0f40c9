//! Fakes for the driver's seams: transport, state sink and scheduler.

use crate::bridge::{HttpResponse, HttpTransport, Method};
use crate::device::{CapabilityEvent, Device, StateSink};
use crate::driver::scheduler::{Scheduler, Task};
use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

pub(crate) fn feeder(id: &str) -> Device {
    Device::new(id, format!("Feeder {id}"))
}

/// Transport answering from a queue of canned responses.
///
/// Runs out with a transport error once the queue is empty.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<(Method, String)>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    pub(crate) fn push_error(&self, err: TransportError) {
        self.responses.lock().push_back(Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<(Method, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn request(&self, method: Method, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push((method, url.to_string()));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("connection refused".to_string())))
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<(String, CapabilityEvent)>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<CapabilityEvent> {
        self.events.lock().iter().map(|(_, e)| *e).collect()
    }

    pub(crate) fn events_for(&self, device_id: &str) -> Vec<CapabilityEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(id, _)| id == device_id)
            .map(|(_, e)| *e)
            .collect()
    }
}

impl StateSink for RecordingSink {
    fn emit(&self, device: &Device, event: CapabilityEvent) {
        self.events.lock().push((device.network_id.clone(), event));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScheduleKind {
    Once(Duration),
    Recurring(Duration),
}

/// Scheduler that only records; tests fire tasks by hand.
#[derive(Default)]
pub(crate) struct RecordingScheduler {
    entries: Mutex<Vec<(String, ScheduleKind, Task)>>,
    cancelled: Mutex<Vec<String>>,
}

impl RecordingScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn scheduled(&self) -> Vec<(String, ScheduleKind)> {
        self.entries
            .lock()
            .iter()
            .map(|(id, kind, _)| (id.clone(), *kind))
            .collect()
    }

    /// Run the task registered at `index`.
    pub(crate) async fn fire(&self, index: usize) {
        let task = self.entries.lock()[index].2.clone();
        task().await;
    }

    pub(crate) fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().clone()
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule_once(&self, device_id: &str, delay: Duration, task: Task) {
        self.entries
            .lock()
            .push((device_id.to_string(), ScheduleKind::Once(delay), task));
    }

    fn schedule_recurring(&self, device_id: &str, period: Duration, task: Task) {
        self.entries
            .lock()
            .push((device_id.to_string(), ScheduleKind::Recurring(period), task));
    }

    fn cancel_device(&self, device_id: &str) -> usize {
        self.cancelled.lock().push(device_id.to_string());
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(id, _, _)| id != device_id);
        before - entries.len()
    }
}
