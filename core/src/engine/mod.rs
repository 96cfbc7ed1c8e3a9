//! engine/mod.rs
//! Aggregation engine: owns the total, the registry and the durable counter.
//!
//! Invariants held here:
//! - `total` only grows between resets, by `count - previous` for accepted reports.
//! - Every change to `total` is persisted before `ingest`/`reset` return.
//! - The engine is single-owner; callers that share it wrap it in one lock
//!   (see `api::Aggregator`).

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::Record;
use crate::persist::{CounterStore, DurableCounter};
use crate::registry::{DeviceRegistry, RegistryError};
use crate::reaper::StaleReaper;
use crate::telemetry::{AggregatorCounters, StateSnapshot};
use crate::types::DeviceId;

/// How a report was treated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IngestKind {
    /// First contact (baseline 0).
    NewDevice,
    /// Known device, count went up.
    Advanced,
    /// Count equal to or below the baseline: dropped.
    Duplicate,
}

/// Observable result of one `ingest`, mainly for logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestEvent {
    pub device_id: DeviceId,
    pub kind: IngestKind,
    pub delta: u64,
    pub new_total: u64,
    /// `false` when the total changed but the store write failed.
    pub persisted: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub struct AggregationEngine<S> {
    total: u64,
    registry: DeviceRegistry,
    counter: DurableCounter<S>,
    counters: AggregatorCounters,
}

impl<S: CounterStore> AggregationEngine<S> {
    /// Restore the total from `counter` and start with an empty registry.
    pub fn new(mut counter: DurableCounter<S>, max_devices: usize) -> Self {
        let total = counter.load();
        info!(total, max_devices, "aggregation engine started");
        Self {
            total,
            registry: DeviceRegistry::with_capacity(max_devices),
            counter,
            counters: AggregatorCounters::default(),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn counters(&self) -> &AggregatorCounters {
        &self.counters
    }

    /// Apply one decoded report.
    pub fn ingest(&mut self, record: &Record, now: Instant) -> Result<IngestEvent, IngestError> {
        let outcome = match self.registry.upsert(
            &record.device_id,
            record.reported_count,
            record.battery_level,
            now,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.counters.add_rejected();
                warn!(device = %record.device_id, error = %e, "report rejected");
                return Err(e.into());
            }
        };

        if record.reported_count <= outcome.previous_count {
            // A new device reporting 0 is registered with nothing to add.
            let kind = if outcome.is_new {
                self.counters.add_accepted();
                IngestKind::NewDevice
            } else {
                self.counters.add_duplicate();
                IngestKind::Duplicate
            };
            debug!(
                device = %record.device_id,
                count = record.reported_count,
                previous = outcome.previous_count,
                "report does not advance counter, dropped"
            );
            return Ok(IngestEvent {
                device_id: record.device_id.clone(),
                kind,
                delta: 0,
                new_total: self.total,
                persisted: true,
            });
        }

        let delta = record.reported_count - outcome.previous_count;
        self.total = self.total.saturating_add(delta);
        self.counters.add_accepted();
        let persisted = self.persist();

        let kind = if outcome.is_new { IngestKind::NewDevice } else { IngestKind::Advanced };
        info!(
            device = %record.device_id,
            delta,
            total = self.total,
            new_device = outcome.is_new,
            "steps accepted"
        );

        Ok(IngestEvent {
            device_id: record.device_id.clone(),
            kind,
            delta,
            new_total: self.total,
            persisted,
        })
    }

    /// Zero the total, forget every device, persist 0.
    pub fn reset(&mut self) -> bool {
        let previous = self.total;
        let devices = self.registry.size();
        self.total = 0;
        self.registry.clear();
        self.counters.add_reset();
        let persisted = self.persist();
        info!(previous_total = previous, devices_cleared = devices, "aggregate reset");
        persisted
    }

    /// Evict devices idle for longer than `max_age`. Never touches the total.
    pub fn reap(&mut self, now: Instant, max_age: Duration) -> Vec<DeviceId> {
        let evicted = StaleReaper::new(max_age).tick(&mut self.registry, now);
        self.counters.add_evicted(evicted.len());
        evicted
    }

    pub fn note_received(&mut self) {
        self.counters.record_received();
    }

    pub fn note_malformed(&mut self) {
        self.counters.record_malformed();
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            total_steps: self.total,
            devices: self.registry.snapshot(),
            counters: self.counters,
        }
    }

    fn persist(&mut self) -> bool {
        match self.counter.save(self.total) {
            Ok(()) => true,
            Err(_) => {
                // Logged by the store wrapper; in-memory total stays authoritative.
                self.counters.add_persist_failure();
                false
            }
        }
    }
}
