//! persist/mod.rs
//! Durable aggregate total: one scalar at a fixed offset, validated on load.

pub mod store;
pub mod file;
pub mod memory;

pub use store::*;
pub use file::*;
pub use memory::*;
