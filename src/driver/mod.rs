//! Device synchronization engine.
//!
//! Polls each feeder through the bridge, maps status onto hub capabilities,
//! and turns hub commands into bridge calls. All timing goes through a
//! [`Scheduler`] so tests can drive it by hand.

pub mod handlers;
pub mod lifecycle;
pub mod mapper;
pub mod scheduler;

pub use handlers::{FeedOutcome, FeederDriver};
pub use lifecycle::{CommandOutcome, DeviceLifecycle, HubCommand};
pub use mapper::{StatusMapper, battery_percent};
pub use scheduler::{Scheduler, Task, TokioScheduler, task};
