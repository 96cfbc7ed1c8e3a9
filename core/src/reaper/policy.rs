//! reaper/policy.rs
//! Inactivity eviction policy.

use std::time::{Duration, Instant};

use tracing::info;

use crate::registry::DeviceRegistry;
use crate::types::DeviceId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StaleReaper {
    pub max_age: Duration,
}

impl StaleReaper {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Remove every device idle for strictly longer than `max_age` at `now`.
    ///
    /// A device refreshed after `now` was sampled has age zero and survives:
    /// a concurrent ingest wins over the pass that started before it.
    /// The evicted baseline is gone; the id's next report starts from 0.
    pub fn tick(&self, registry: &mut DeviceRegistry, now: Instant) -> Vec<DeviceId> {
        let stale = registry.stale_ids(now, self.max_age);
        for id in &stale {
            if let Some(rec) = registry.remove(id) {
                info!(
                    device = %id,
                    last_count = rec.last_reported_count,
                    idle_secs = now.saturating_duration_since(rec.last_seen_at).as_secs(),
                    "stale device evicted"
                );
            }
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DeviceId {
        DeviceId::parse(s).unwrap()
    }

    #[test]
    fn exactly_max_age_is_kept() {
        let mut reg = DeviceRegistry::with_capacity(4);
        let t0 = Instant::now();
        reg.upsert(&id("node-a"), 10, 90.0, t0).unwrap();

        let reaper = StaleReaper::new(Duration::from_secs(300));
        assert!(reaper.tick(&mut reg, t0 + Duration::from_secs(300)).is_empty());
        assert_eq!(reaper.tick(&mut reg, t0 + Duration::from_secs(301)), vec![id("node-a")]);
        assert!(reg.is_empty());
    }

    #[test]
    fn refresh_after_pass_start_survives() {
        let mut reg = DeviceRegistry::with_capacity(4);
        let t0 = Instant::now();
        let pass_now = t0 + Duration::from_secs(400);
        // Seen after the pass sampled its clock.
        reg.upsert(&id("node-a"), 10, 90.0, pass_now + Duration::from_millis(5)).unwrap();
        reg.upsert(&id("node-b"), 10, 90.0, t0).unwrap();

        let evicted = StaleReaper::new(Duration::from_secs(300)).tick(&mut reg, pass_now);
        assert_eq!(evicted, vec![id("node-b")]);
        assert!(reg.get(&id("node-a")).is_some());
    }
}
