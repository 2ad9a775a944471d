//! rusty-ads/crates/ra-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Ads.

pub mod error;
pub mod forms;
pub mod humanize;
pub mod models;
pub mod ownership;
pub mod tags;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
