use crate::device::{Device, DevicePreferences};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let value = value.trim();
            // Remove surrounding quotes if present
            let value = if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                &value[1..value.len() - 1]
            } else {
                value
            };
            Some((key.trim(), value))
        })
        .collect()
}

/// Linear voltage-to-percent calibration of the feeder battery pack.
///
/// Fixed per hardware, not a user preference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryCalibration {
    /// Voltage reported as 0%.
    pub empty_volts: f64,
    /// Voltage reported as 100%.
    pub full_volts: f64,
}

impl Default for BatteryCalibration {
    fn default() -> Self {
        Self {
            empty_volts: 3.5,
            full_volts: 6.0,
        }
    }
}

/// Timing and calibration constants of the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Period of the recurring status poll.
    pub poll_interval: Duration,
    /// How long the "feeding" switch stays on after a successful feed.
    pub indicator_revert_delay: Duration,
    /// Delay of the status refresh that follows a successful feed.
    pub follow_up_refresh_delay: Duration,
    pub battery: BatteryCalibration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            indicator_revert_delay: Duration::from_secs(2),
            follow_up_refresh_delay: Duration::from_secs(5),
            battery: BatteryCalibration::default(),
        }
    }
}

/// Process-wide bridge settings applied to every configured feeder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDefaults {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub portions: Option<u32>,
    /// Per-request timeout; reqwest's defaults apply when unset.
    pub request_timeout_secs: Option<u64>,
}

impl BridgeDefaults {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn preferences(&self) -> DevicePreferences {
        DevicePreferences {
            bridge_host: self.host.clone(),
            bridge_port: self.port,
            portions: self.portions,
        }
    }
}

/// A feeder the binary should drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeederEntry {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub driver: DriverConfig,
    pub bridge: BridgeDefaults,
    pub feeders: Vec<FeederEntry>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("BRIDGE_HOST")
            && !host.is_empty()
        {
            config.bridge.host = Some(host);
        }
        if let Some(port) = lookup("BRIDGE_PORT")
            && let Ok(p) = port.parse()
        {
            config.bridge.port = Some(p);
        }
        if let Some(portions) = lookup("FEED_PORTIONS")
            && let Ok(p) = portions.parse()
        {
            config.bridge.portions = Some(p);
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS")
            && let Ok(t) = timeout.parse()
        {
            config.bridge.request_timeout_secs = Some(t);
        }
        if let Some(interval) = lookup("POLL_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
            && secs > 0
        {
            config.driver.poll_interval = Duration::from_secs(secs);
        }
        if let Some(feeders) = lookup("FEEDERS") {
            config.feeders = parse_feeders(&feeders);
        }

        config
    }

    /// Hub devices for every configured feeder, carrying the bridge defaults
    /// as their preferences.
    pub fn devices(&self) -> Vec<Device> {
        self.feeders
            .iter()
            .map(|f| Device::new(&f.id, &f.label).with_preferences(self.bridge.preferences()))
            .collect()
    }
}

/// Parse a comma separated `id[:label]` list. The label defaults to the id.
pub fn parse_feeders(value: &str) -> Vec<FeederEntry> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| {
            let (id, label) = match entry.split_once(':') {
                Some((id, label)) => (id.trim(), label.trim()),
                None => (entry, entry),
            };
            if id.is_empty() {
                return None;
            }
            let label = if label.is_empty() { id } else { label };
            Some(FeederEntry {
                id: id.to_string(),
                label: label.to_string(),
            })
        })
        .collect()
}
