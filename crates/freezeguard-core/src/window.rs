//! Window evaluation results and dispatch

use chrono::DateTime;
use chrono_tz::Tz;
use freezeguard_config::WindowSpec;
use tracing::debug;

use crate::{FixedWindowEvaluator, RecurrenceWindowEvaluator};

/// Reason given when no window is active
pub const NO_ACTIVE_WINDOW_REASON: &str = "No active freeze window";

/// Which kind of window produced a freeze
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    None,
    Fixed,
    Recurring,
}

impl WindowType {
    /// Value written to the `window_type` output
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowType::None => "NONE",
            WindowType::Fixed => "FIXED",
            WindowType::Recurring => "RRULE",
        }
    }
}

/// Outcome of checking the configured window at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub is_frozen: bool,
    pub window_type: WindowType,
    pub window_name: String,
    /// Set only while frozen
    pub active_start: Option<DateTime<Tz>>,
    /// Set only while frozen
    pub active_end: Option<DateTime<Tz>>,
    pub reason: String,
}

impl EvaluationResult {
    pub fn not_frozen() -> Self {
        Self {
            is_frozen: false,
            window_type: WindowType::None,
            window_name: String::new(),
            active_start: None,
            active_end: None,
            reason: NO_ACTIVE_WINDOW_REASON.into(),
        }
    }
}

/// Check `window` at `now`, which carries the configured zone
pub fn evaluate_window(window: &WindowSpec, now: &DateTime<Tz>) -> EvaluationResult {
    let result = match window {
        WindowSpec::None => EvaluationResult::not_frozen(),
        WindowSpec::Fixed { start, end } => FixedWindowEvaluator::new(start, end).evaluate(now),
        WindowSpec::Recurring {
            rule,
            duration_minutes,
        } => RecurrenceWindowEvaluator::new(rule, *duration_minutes).evaluate(now),
    };

    debug!(
        window = window.kind(),
        is_frozen = result.is_frozen,
        "Window evaluated"
    );
    result
}
