//! Wire types of the bridge API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `GET /status/{id}`.
///
/// Every field is optional; missing fields simply produce no state update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Battery voltage in volts.
    #[serde(default)]
    pub battery: Option<f64>,
    #[serde(default)]
    pub connected: Option<bool>,
    /// Passed through from the feeder cloud untouched; seen as a bool or an
    /// integer flag. `null` counts as absent.
    #[serde(default)]
    pub food_low: Option<Value>,

    // Diagnostics only, never mapped to capabilities. A value of the wrong
    // shape is dropped instead of failing the whole body.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub adapter_installed: Option<bool>,
    /// Hopper fill estimate in percent, averaged over both infrared sensors.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub food_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub last_feed: Option<LastFeed>,
}

/// Most recent completed feed as reported by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastFeed {
    /// Timestamp string exactly as the feeder cloud reports it.
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub portions: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<String>,
}

/// Decode an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Body of `POST /feed/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResult {
    pub status: String,
}

impl FeedResult {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
