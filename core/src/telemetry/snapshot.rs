//! telemetry/snapshot.rs
//!
//! Immutable view of the aggregate state, rebuilt after every mutation and
//! swapped in atomically. Readers hold an `Arc` to one snapshot; a later
//! mutation publishes a new one and never touches theirs.

use crate::registry::DeviceView;
use crate::telemetry::counters::AggregatorCounters;

#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub total_steps: u64,
    /// Ordered by device id.
    pub devices: Vec<DeviceView>,
    pub counters: AggregatorCounters,
}

impl StateSnapshot {
    pub fn empty(total_steps: u64) -> Self {
        Self {
            total_steps,
            devices: Vec::new(),
            counters: AggregatorCounters::default(),
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device(&self, id: &str) -> Option<&DeviceView> {
        self.devices.iter().find(|d| d.device_id.as_str() == id)
    }
}
