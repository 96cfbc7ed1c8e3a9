//! registry/mod.rs
//! Per-device latest counter and last-seen time.
//!
//! - Keyed by `DeviceId` in a hash map: O(1) upsert/remove.
//! - Bounded: a new id is refused once `capacity` devices are tracked.
//! - Nothing here blocks; serialization is the engine's job.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::constants::DEFAULT_MAX_DEVICES;
use crate::types::DeviceId;

/// Latest accepted state of one device.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceRecord {
    pub device_id: DeviceId,
    /// Highest count accepted since the record was created.
    pub last_reported_count: u64,
    pub last_seen_at: Instant,
    pub battery_level: f32,
}

/// Result of `upsert`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub is_new: bool,
    /// Baseline the new count is compared against (0 for a new device).
    pub previous_count: u64,
}

/// Immutable per-device view handed to readers.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceView {
    pub device_id: DeviceId,
    pub count: u64,
    pub last_seen_at: Instant,
    pub battery_level: f32,
}

impl DeviceView {
    /// Whole seconds since the device was last heard from, relative to `now`.
    pub fn seconds_since_seen(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.last_seen_at).as_secs()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry full: {capacity} devices tracked, refusing {device}")]
    Full { capacity: usize, device: DeviceId },
}

#[derive(Debug)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, DeviceRecord>,
    capacity: usize,
}

impl DeviceRegistry {
    /// `capacity` bounds the device count; only a small table is reserved up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            devices: HashMap::with_capacity(capacity.min(DEFAULT_MAX_DEVICES)),
            capacity,
        }
    }

    /// Create or refresh a device.
    ///
    /// `last_seen_at` and battery are refreshed on every call. The stored count
    /// only moves up; a lower count leaves the baseline where it was.
    pub fn upsert(
        &mut self,
        id: &DeviceId,
        count: u64,
        battery_level: f32,
        now: Instant,
    ) -> Result<UpsertOutcome, RegistryError> {
        if let Some(rec) = self.devices.get_mut(id) {
            let previous_count = rec.last_reported_count;
            rec.last_reported_count = previous_count.max(count);
            rec.last_seen_at = now;
            rec.battery_level = battery_level;
            return Ok(UpsertOutcome { is_new: false, previous_count });
        }

        if self.devices.len() >= self.capacity {
            return Err(RegistryError::Full { capacity: self.capacity, device: id.clone() });
        }

        self.devices.insert(
            id.clone(),
            DeviceRecord {
                device_id: id.clone(),
                last_reported_count: count,
                last_seen_at: now,
                battery_level,
            },
        );
        Ok(UpsertOutcome { is_new: true, previous_count: 0 })
    }

    pub fn remove(&mut self, id: &DeviceId) -> Option<DeviceRecord> {
        self.devices.remove(id)
    }

    pub fn get(&self, id: &DeviceId) -> Option<&DeviceRecord> {
        self.devices.get(id)
    }

    pub fn size(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Ids whose last contact is strictly older than `max_age` at `now`.
    /// A record touched after `now` was taken counts as age zero.
    pub fn stale_ids(&self, now: Instant, max_age: Duration) -> Vec<DeviceId> {
        self.devices
            .values()
            .filter(|rec| now.saturating_duration_since(rec.last_seen_at) > max_age)
            .map(|rec| rec.device_id.clone())
            .collect()
    }

    /// Views ordered by device id.
    pub fn snapshot(&self) -> Vec<DeviceView> {
        let mut views: Vec<DeviceView> = self
            .devices
            .values()
            .map(|rec| DeviceView {
                device_id: rec.device_id.clone(),
                count: rec.last_reported_count,
                last_seen_at: rec.last_seen_at,
                battery_level: rec.battery_level,
            })
            .collect();
        views.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DeviceId {
        DeviceId::parse(s).unwrap()
    }

    #[test]
    fn first_contact_is_new_with_zero_baseline() {
        let mut reg = DeviceRegistry::with_capacity(4);
        let out = reg.upsert(&id("node-a"), 42, 80.0, Instant::now()).unwrap();
        assert_eq!(out, UpsertOutcome { is_new: true, previous_count: 0 });
        assert_eq!(reg.size(), 1);
    }

    #[test]
    fn lower_count_keeps_baseline_but_refreshes_last_seen() {
        let mut reg = DeviceRegistry::with_capacity(4);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(10);
        reg.upsert(&id("node-a"), 100, 80.0, t0).unwrap();

        let out = reg.upsert(&id("node-a"), 60, 79.0, t1).unwrap();
        assert_eq!(out.previous_count, 100);

        let rec = reg.get(&id("node-a")).unwrap();
        assert_eq!(rec.last_reported_count, 100);
        assert_eq!(rec.last_seen_at, t1);
        assert_eq!(rec.battery_level, 79.0);
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let mut reg = DeviceRegistry::with_capacity(4);
        let now = Instant::now();
        for name in ["node-c", "node-a", "node-b"] {
            reg.upsert(&id(name), 1, 50.0, now).unwrap();
        }
        let ids: Vec<String> = reg.snapshot().into_iter().map(|v| v.device_id.to_string()).collect();
        assert_eq!(ids, vec!["node-a", "node-b", "node-c"]);
    }

    #[test]
    fn full_registry_refuses_new_ids_only() {
        let mut reg = DeviceRegistry::with_capacity(1);
        let now = Instant::now();
        reg.upsert(&id("node-a"), 1, 50.0, now).unwrap();

        let err = reg.upsert(&id("node-b"), 1, 50.0, now).unwrap_err();
        assert!(matches!(err, RegistryError::Full { capacity: 1, .. }));

        // known ids still update
        assert!(reg.upsert(&id("node-a"), 2, 50.0, now).is_ok());
        assert_eq!(reg.size(), 1);
    }

    #[test]
    fn stale_ids_uses_strict_greater_than() {
        let mut reg = DeviceRegistry::with_capacity(4);
        let t0 = Instant::now();
        reg.upsert(&id("node-a"), 1, 50.0, t0).unwrap();
        let max_age = Duration::from_secs(300);

        assert!(reg.stale_ids(t0 + max_age, max_age).is_empty());
        assert_eq!(reg.stale_ids(t0 + max_age + Duration::from_secs(1), max_age), vec![id("node-a")]);
    }

    #[test]
    fn record_refreshed_after_pass_start_is_not_stale() {
        let mut reg = DeviceRegistry::with_capacity(4);
        let pass_start = Instant::now();
        reg.upsert(&id("node-a"), 1, 50.0, pass_start + Duration::from_secs(5)).unwrap();
        assert!(reg.stale_ids(pass_start, Duration::ZERO).is_empty());
    }

    #[test]
    fn huge_capacity_does_not_reserve_up_front() {
        let mut reg = DeviceRegistry::with_capacity(usize::MAX);
        reg.upsert(&id("node-a"), 1, 50.0, Instant::now()).unwrap();
        assert_eq!(reg.size(), 1);
    }
}
