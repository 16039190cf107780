//! Freeze evaluation engine for freezeguard
//!
//! This crate decides whether a deployment may proceed:
//! - Window evaluation (fixed bounds or a recurrence rule plus duration)
//! - Overrides by pull request label or triggering actor
//! - The enforcement decision (allow, warn or block) and its exit code
//! - The report rendered as action outputs and a run summary
//!
//! Nothing here reads the process environment. The clock, the trigger
//! context and the event payload are all passed in.

mod decision;
mod engine;
mod fixed;
mod overrides;
mod payload;
mod recurrence;
mod report;
mod window;

pub use decision::*;
pub use engine::*;
pub use fixed::*;
pub use overrides::*;
pub use payload::*;
pub use recurrence::*;
pub use report::*;
pub use window::*;
