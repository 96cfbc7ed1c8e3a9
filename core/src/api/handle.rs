// ## `api/handle.rs`: stable public API

//! Shared handle over the aggregate state.
//!
//! Concurrency model:
//! - One `Mutex` around the engine is the only mutation boundary. Registry
//!   upsert/remove, the total's read-modify-write and the store write all
//!   happen under it, so `ingest`, `tick` and `reset` never interleave.
//! - After each mutation, still inside the lock, a fresh `StateSnapshot` is
//!   published through `ArcSwap`. Queries only load that snapshot and never
//!   take the lock.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use chrono::Utc;
use tracing::{info, warn};

use crate::codec::{decode, Record};
use crate::config::AggregatorConfig;
use crate::constants::RESET_CONFIRMATION;
use crate::engine::{AggregationEngine, IngestError, IngestEvent};
use crate::persist::{CounterStore, DurableCounter, FileCounterStore, MemoryCounterStore};
use crate::reaper::ReaperCycle;
use crate::telemetry::{AggregatorCounters, StateSnapshot};
use crate::types::{CoreError, DeviceId};
use crate::api::views::{DeviceEntry, ResetSource, StatusReport, Summary};

type Engine = AggregationEngine<Box<dyn CounterStore>>;

struct Shared {
    engine: Mutex<Engine>,
    published: ArcSwap<StateSnapshot>,
    config: AggregatorConfig,
    started_at: Instant,
}

/// Cloneable facade; every clone drives the same state.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Shared>,
}

impl Aggregator {
    /// Build from config: file store when `store_path` is set, memory otherwise.
    pub fn new(config: AggregatorConfig) -> Result<Self, CoreError> {
        let store: Box<dyn CounterStore> = match &config.store_path {
            Some(path) => Box::new(FileCounterStore::new(path)),
            None => Box::new(MemoryCounterStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: AggregatorConfig, store: Box<dyn CounterStore>) -> Result<Self, CoreError> {
        config.validate()?;
        info!(store = %store.describe(), max_age_secs = config.max_age_secs, "opening aggregator");

        let engine = AggregationEngine::new(
            DurableCounter::new(store, config.sanity_ceiling),
            config.max_devices,
        );
        let published = ArcSwap::from_pointee(engine.snapshot());

        Ok(Self {
            inner: Arc::new(Shared {
                engine: Mutex::new(engine),
                published,
                config,
                started_at: Instant::now(),
            }),
        })
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Inbound radio handler entry point.
    /// Malformed bytes are logged and counted; the state is untouched.
    pub fn ingest_bytes(&self, bytes: &[u8]) -> Option<IngestEvent> {
        self.ingest_bytes_at(bytes, Instant::now())
    }

    pub fn ingest_bytes_at(&self, bytes: &[u8], now: Instant) -> Option<IngestEvent> {
        self.mutate(|engine| {
            engine.note_received();
            match apply_bytes(engine, bytes, now) {
                Ok(event) => Some(event),
                Err(CoreError::Decode(e)) => {
                    engine.note_malformed();
                    warn!(len = bytes.len(), bytes = %hex::encode(bytes), error = %e, "malformed record dropped");
                    None
                }
                // Rejections are counted and logged by the engine.
                Err(_) => None,
            }
        })
    }

    /// Apply an already decoded record.
    pub fn ingest_record(&self, record: &Record) -> Result<IngestEvent, IngestError> {
        self.ingest_record_at(record, Instant::now())
    }

    pub fn ingest_record_at(&self, record: &Record, now: Instant) -> Result<IngestEvent, IngestError> {
        self.mutate(|engine| {
            engine.note_received();
            engine.ingest(record, now)
        })
    }

    /// One reaper pass with the configured max age.
    pub fn tick(&self) -> Vec<DeviceId> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&self, now: Instant) -> Vec<DeviceId> {
        let max_age = self.inner.config.max_age();
        self.mutate(|engine| engine.reap(now, max_age))
    }

    /// Reset command from the presentation layer.
    pub fn reset(&self) -> &'static str {
        self.reset_from(ResetSource::Command)
    }

    pub fn reset_from(&self, source: ResetSource) -> &'static str {
        info!(%source, "reset requested");
        self.mutate(|engine| engine.reset());
        RESET_CONFIRMATION
    }

    /// Start the periodic reaper on its own thread.
    pub fn spawn_reaper(&self) -> std::io::Result<ReaperCycle> {
        ReaperCycle::spawn(self.clone(), self.inner.config.reap_interval())
    }

    // -------------------------------------------------------------------------
    // Queries (lock-free)
    // -------------------------------------------------------------------------

    /// Current published state.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.inner.published.load_full()
    }

    pub fn total(&self) -> u64 {
        self.inner.published.load().total_steps
    }

    pub fn get_summary(&self) -> Summary {
        let snap = self.inner.published.load();
        Summary {
            total_steps: snap.total_steps,
            device_count: snap.device_count(),
            timestamp: Utc::now(),
        }
    }

    pub fn status(&self, wifi_connected: bool) -> StatusReport {
        let snap = self.inner.published.load();
        StatusReport {
            total_steps: snap.total_steps,
            device_count: snap.device_count(),
            wifi_connected,
            uptime: self.inner.started_at.elapsed().as_secs(),
        }
    }

    pub fn list_devices(&self) -> Vec<DeviceEntry> {
        self.list_devices_at(Instant::now())
    }

    /// Devices ordered by id, ages relative to `now`.
    pub fn list_devices_at(&self, now: Instant) -> Vec<DeviceEntry> {
        self.inner
            .published
            .load()
            .devices
            .iter()
            .map(|view| DeviceEntry::from_view(view, now))
            .collect()
    }

    pub fn counters(&self) -> AggregatorCounters {
        self.inner.published.load().counters
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Engine) -> T) -> T {
        // A panic mid-call cannot leave the engine torn: every mutation is a
        // single assignment sequence, so a poisoned lock is still usable.
        let mut engine = self.inner.engine.lock().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut engine);
        self.inner.published.store(Arc::new(engine.snapshot()));
        out
    }
}

fn apply_bytes(engine: &mut Engine, bytes: &[u8], now: Instant) -> Result<IngestEvent, CoreError> {
    let record = decode(bytes)?;
    Ok(engine.ingest(&record, now)?)
}
