//! api/views.rs
//! Read models returned by the facade, serialized as the camelCase JSON the
//! presentation layer expects.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::DeviceView;
use crate::types::DeviceId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_steps: u64,
    pub device_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Summary query as served to the page: `{totalSteps, deviceCount, wifiConnected, uptime}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub total_steps: u64,
    pub device_count: usize,
    pub wifi_connected: bool,
    /// Seconds since the facade was created.
    pub uptime: u64,
}

/// Devices query element: `{id, steps, lastSeen: "<n>s ago"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    pub id: DeviceId,
    pub steps: u64,
    pub last_seen: String,
    #[serde(skip)]
    pub seconds_since_seen: u64,
    #[serde(skip)]
    pub battery: f32,
}

impl DeviceEntry {
    pub fn from_view(view: &DeviceView, now: Instant) -> Self {
        let secs = view.seconds_since_seen(now);
        Self {
            id: view.device_id.clone(),
            steps: view.count,
            last_seen: format!("{}s ago", secs),
            seconds_since_seen: secs,
            battery: view.battery_level,
        }
    }
}

/// Where a reset request came from; both paths do the same thing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetSource {
    /// Reset command from the presentation layer.
    Command,
    /// Debounced physical button edge.
    Button,
}

impl fmt::Display for ResetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResetSource::Command => "command",
            ResetSource::Button  => "button",
        };
        f.write_str(name)
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}
