//! Run report
//!
//! Everything one evaluation produced, rendered as action outputs and as the
//! markdown block appended to the run summary.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use freezeguard_util::{format_iso, format_summary_local, format_summary_utc, format_window_bound};
use std::fmt::Write;

use crate::{Annotation, Decision, EvaluationResult, OverrideResult};

#[derive(Debug, Clone, PartialEq)]
pub struct FreezeReport {
    pub environment: String,
    pub now_local: DateTime<Tz>,
    pub now_utc: DateTime<Utc>,
    pub evaluation: EvaluationResult,
    pub overrides: OverrideResult,
    pub decision: Decision,
    /// Evaluator reason, or the override reason when an override applied
    pub reason: String,
    pub fail_message: String,
    /// Whether the summary block should be written
    pub summary_enabled: bool,
}

impl FreezeReport {
    pub fn is_frozen(&self) -> bool {
        self.evaluation.is_frozen
    }

    pub fn exit_code(&self) -> u8 {
        self.decision.exit_code
    }

    /// Output values in the order they are written
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        let bound = |dt: &Option<DateTime<Tz>>| dt.as_ref().map(format_iso).unwrap_or_default();

        vec![
            ("is_frozen", self.evaluation.is_frozen.to_string()),
            ("decision", self.decision.verdict.as_str().to_string()),
            ("environment", self.environment.clone()),
            ("now_local", format_iso(&self.now_local)),
            ("now_utc", format_iso(&self.now_utc)),
            ("window_type", self.evaluation.window_type.as_str().to_string()),
            ("window_name", self.evaluation.window_name.clone()),
            ("reason", self.reason.clone()),
            ("freeze_start", bound(&self.evaluation.active_start)),
            ("freeze_end", bound(&self.evaluation.active_end)),
            ("overridden", self.overrides.overridden.to_string()),
            ("override_reason", self.overrides.reason.clone()),
        ]
    }

    /// Override warnings followed by the decision's own annotations
    pub fn annotations(&self) -> Vec<Annotation> {
        self.overrides
            .warnings
            .iter()
            .map(|w| Annotation::warning(w.clone()))
            .chain(self.decision.annotations.iter().cloned())
            .collect()
    }

    /// Markdown block for the run summary
    pub fn summary_markdown(&self) -> String {
        let verdict = self.decision.verdict;
        let status = if self.evaluation.is_frozen { "Frozen" } else { "Free" };

        let mut out = String::new();
        let _ = write!(
            out,
            "\n### Release Freeze Status: {} {}\n\n\
             | Metric | Value |\n\
             | :--- | :--- |\n\
             | **Environment** | `{}` |\n\
             | **Local Time** | `{}` |\n\
             | **UTC Time** | `{}` |\n\
             | **Status** | `{}` |\n\n",
            verdict.as_str(),
            verdict.emoji(),
            self.environment,
            format_summary_local(&self.now_local),
            format_summary_utc(&self.now_utc),
            status,
        );

        if let (Some(start), Some(end)) = (&self.evaluation.active_start, &self.evaluation.active_end) {
            let _ = write!(
                out,
                "#### Active Freeze Window\n- **Start:** {}\n- **End:** {}\n",
                format_window_bound(start),
                format_window_bound(end),
            );
        }

        if !self.overrides.reason.is_empty() {
            let _ = writeln!(out, "#### Override Active\n{}", self.overrides.reason);
        }

        out
    }
}
