//! Fixed freeze windows

use chrono::DateTime;
use chrono_tz::Tz;
use freezeguard_util::Timestamp;

use crate::{EvaluationResult, WindowType};

/// Evaluates a window with explicit bounds. Both bounds are inclusive.
#[derive(Debug, Clone, Copy)]
pub struct FixedWindowEvaluator<'a> {
    start: &'a Timestamp,
    end: &'a Timestamp,
}

impl<'a> FixedWindowEvaluator<'a> {
    pub fn new(start: &'a Timestamp, end: &'a Timestamp) -> Self {
        Self { start, end }
    }

    /// Naive bounds are read as local time in the zone of `now`
    pub fn evaluate(&self, now: &DateTime<Tz>) -> EvaluationResult {
        let tz = now.timezone();
        let start = self.start.in_zone(&tz);
        let end = self.end.in_zone(&tz);

        if start <= *now && *now <= end {
            EvaluationResult {
                is_frozen: true,
                window_type: WindowType::Fixed,
                window_name: "Fixed Freeze Window".into(),
                active_start: Some(start),
                active_end: Some(end),
                reason: "Current time is within fixed freeze window".into(),
            }
        } else {
            EvaluationResult::not_frozen()
        }
    }
}
