//! stepagg-core
//!
//! Pure Rust step telemetry aggregation engine.
//! No Python, no PyO3, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

// Leaves first
pub mod codec;
pub mod registry;
pub mod persist;
pub mod telemetry;

pub mod engine;
pub mod reaper;

// External surface
pub mod api;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::api::{Aggregator, DeviceEntry, ResetSource, StatusReport, Summary};
    pub use crate::codec::{decode, DecodeError, Record};
    pub use crate::config::AggregatorConfig;
    pub use crate::engine::{AggregationEngine, IngestEvent, IngestKind};
    pub use crate::persist::{CounterStore, DurableCounter, FileCounterStore, MemoryCounterStore};
    pub use crate::types::{CoreError, DeviceId};
}
