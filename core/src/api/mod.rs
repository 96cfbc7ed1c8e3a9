//! api/mod.rs
//! Query/command facade: the surface the presentation layer talks to.

pub mod handle;
pub mod views;

pub use handle::*;
pub use views::*;
