//! telemetry/counters.rs
//! Monotonic event counters kept next to the aggregate state.
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorCounters {
    /// Raw records handed to the facade, valid or not.
    pub records_received: u64,
    pub records_malformed: u64,
    /// Reports that raised the total (or registered a new device).
    pub reports_accepted: u64,
    /// Equal or lower counts: dropped without touching the total.
    pub reports_duplicate: u64,
    /// Refused because the registry was full.
    pub reports_rejected: u64,
    pub devices_evicted: u64,
    pub persist_failures: u64,
    pub resets: u64,
}

impl AggregatorCounters {
    pub fn record_received(&mut self) {
        self.records_received += 1;
    }

    pub fn record_malformed(&mut self) {
        self.records_malformed += 1;
    }

    pub fn add_accepted(&mut self) {
        self.reports_accepted += 1;
    }

    pub fn add_duplicate(&mut self) {
        self.reports_duplicate += 1;
    }

    pub fn add_rejected(&mut self) {
        self.reports_rejected += 1;
    }

    pub fn add_evicted(&mut self, n: usize) {
        self.devices_evicted += n as u64;
    }

    pub fn add_persist_failure(&mut self) {
        self.persist_failures += 1;
    }

    pub fn add_reset(&mut self) {
        self.resets += 1;
    }

    /// Reports that reached the engine (decoded successfully).
    pub fn reports_seen(&self) -> u64 {
        self.reports_accepted + self.reports_duplicate + self.reports_rejected
    }
}
