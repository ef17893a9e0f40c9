//! Bridge client: URL building and response decoding.

use super::transport::{HttpTransport, Method};
use super::types::{FeedResult, HealthStatus, StatusPayload};
use crate::device::{Device, DevicePreferences};
use crate::error::{BridgeError, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Issues status and feed requests against a device's bridge.
///
/// The bridge address comes from each device's preferences, so one client
/// serves every feeder regardless of which bridge it sits behind.
#[derive(Clone)]
pub struct BridgeClient {
    transport: Arc<dyn HttpTransport>,
}

impl BridgeClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// `http://{host}:{port}` for the given preferences. IPv6 literals are
    /// bracketed.
    pub fn base_url(preferences: &DevicePreferences) -> String {
        let host = preferences.host();
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{}]:{}", host, preferences.port())
        } else {
            format!("http://{}:{}", host, preferences.port())
        }
    }

    pub fn status_url(device: &Device) -> String {
        format!(
            "{}/status/{}",
            Self::base_url(&device.preferences),
            device.network_id
        )
    }

    pub fn feed_url(device: &Device, portions: u32) -> String {
        format!(
            "{}/feed/{}?portions={}",
            Self::base_url(&device.preferences),
            device.network_id,
            portions
        )
    }

    pub fn health_url(preferences: &DevicePreferences) -> String {
        format!("{}/health", Self::base_url(preferences))
    }

    /// `GET /status/{id}`.
    pub async fn fetch_status(&self, device: &Device) -> Result<StatusPayload> {
        self.request_json(Method::Get, Self::status_url(device)).await
    }

    /// `POST /feed/{id}?portions={n}`.
    ///
    /// A decoded body whose status is not `"success"` is still `Ok`; the
    /// caller decides what a non-success result means.
    pub async fn trigger_feed(&self, device: &Device, portions: u32) -> Result<FeedResult> {
        self.request_json(Method::Post, Self::feed_url(device, portions))
            .await
    }

    /// `GET /health` on the bridge described by `preferences`.
    pub async fn health(&self, preferences: &DevicePreferences) -> Result<HealthStatus> {
        self.request_json(Method::Get, Self::health_url(preferences))
            .await
    }

    async fn request_json<T: DeserializeOwned>(&self, method: Method, url: String) -> Result<T> {
        let resp = match self.transport.request(method, &url).await {
            Ok(resp) => resp,
            Err(e) => {
                return Err(BridgeError::Connect {
                    url,
                    detail: e.to_string(),
                });
            }
        };

        if resp.status != 200 {
            return Err(BridgeError::Http {
                status: resp.status,
                url,
            });
        }

        serde_json::from_slice(&resp.body).map_err(|e| BridgeError::Decode {
            url,
            detail: e.to_string(),
        })
    }
}
