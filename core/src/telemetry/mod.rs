//! telemetry/mod.rs
//! Aggregator counters, published state snapshots and log setup.
//!
//! - Counters are mutated only inside the engine's serialized section.
//! - Snapshots are immutable; readers never see a half-applied ingest.

pub mod counters;
pub mod snapshot;
pub mod logging;

pub use counters::*;
pub use snapshot::*;
pub use logging::*;
