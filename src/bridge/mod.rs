//! Client side of the local feeder bridge.
//!
//! The bridge is a small HTTP service that talks to the feeder cloud on our
//! behalf. It exposes:
//!
//! - `GET /status/{id}` with battery voltage, connectivity and food-low flag
//! - `POST /feed/{id}?portions={n}` to dispense food
//! - `GET /health` for a liveness probe
//!
//! Anything other than a 200 with a decodable JSON body is a failure.

mod client;
mod transport;
mod types;

pub use client::BridgeClient;
pub use transport::{HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use types::{FeedResult, HealthStatus, LastFeed, StatusPayload};
