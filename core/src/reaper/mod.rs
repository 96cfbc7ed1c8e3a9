//! reaper/mod.rs
//! Stale device eviction: the policy and the background cycle that drives it.

pub mod policy;
pub mod cycle;

pub use policy::*;
pub use cycle::*;
