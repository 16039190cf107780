//! Shared utilities for freezeguard
//!
//! This crate provides:
//! - Error types
//! - Time sources (system clock, fixed clock for deterministic runs)
//! - Timezone parsing and localization of naive local times
//! - Timestamp parsing and ISO-8601 formatting

mod error;
mod time;

pub use error::*;
pub use time::*;
