//! codec/mod.rs
//! Receive-only decoding of the fixed-size telemetry record sent by sensor nodes.
//!
//! Notes:
//! - Little-endian across all multi-byte fields.
//! - Length selects the layout; nothing is reinterpreted in place.
//! - A record is either fully valid or rejected, there is no partial acceptance.

pub mod types;
pub mod decode;

pub use types::*;
pub use decode::*;
