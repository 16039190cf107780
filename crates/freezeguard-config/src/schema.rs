//! Raw input schema (as read from a TOML file or action environment variables)

use serde::{Deserialize, Serialize};

/// Names of every recognized input, in documentation order
pub const INPUT_NAMES: [&str; 11] = [
    "environment",
    "behavior",
    "timezone",
    "freeze_start",
    "freeze_end",
    "rrule",
    "duration_minutes",
    "allow_override_label",
    "allow_override_actor",
    "fail_message",
    "summary",
];

/// Raw inputs, before validation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawInputs {
    /// Target environment name (required)
    pub environment: Option<String>,

    /// "block", "warn" or "allow"
    pub behavior: Option<String>,

    /// IANA zone identifier
    pub timezone: Option<String>,

    /// Fixed window start
    pub freeze_start: Option<String>,

    /// Fixed window end
    pub freeze_end: Option<String>,

    /// Recurrence rule
    pub rrule: Option<String>,

    /// Length of each recurring occurrence
    pub duration_minutes: Option<RawNumber>,

    /// Pull request label that lifts an active freeze
    pub allow_override_label: Option<String>,

    /// Actor allowed to lift an active freeze
    pub allow_override_actor: Option<String>,

    /// Message reported when the freeze blocks or warns
    pub fail_message: Option<String>,

    /// Whether to write the run summary
    pub summary: Option<RawFlag>,
}

/// A number that may arrive as a TOML integer or as text
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawNumber {
    Integer(i64),
    Text(String),
}

/// A flag that may arrive as a TOML boolean or as text
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Text(String),
}

impl RawFlag {
    /// Only an explicit `true` (any case) enables the flag
    pub fn is_enabled(&self) -> bool {
        match self {
            RawFlag::Bool(value) => *value,
            RawFlag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
        }
    }
}

impl RawInputs {
    /// Read inputs through `lookup`, keyed by action variable name
    /// (`INPUT_ENVIRONMENT`, `INPUT_FREEZE_START`, ...).
    ///
    /// Blank values count as absent, since action runners export every
    /// declared input whether or not the workflow set it.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&input_variable(name)).filter(|value| !value.trim().is_empty())
        };

        Self {
            environment: get("environment"),
            behavior: get("behavior"),
            timezone: get("timezone"),
            freeze_start: get("freeze_start"),
            freeze_end: get("freeze_end"),
            rrule: get("rrule"),
            duration_minutes: get("duration_minutes").map(RawNumber::Text),
            allow_override_label: get("allow_override_label"),
            allow_override_actor: get("allow_override_actor"),
            fail_message: get("fail_message"),
            summary: get("summary").map(RawFlag::Text),
        }
    }

    /// Layer `self` over `base`: any input set here wins
    pub fn merged_over(self, base: RawInputs) -> RawInputs {
        RawInputs {
            environment: self.environment.or(base.environment),
            behavior: self.behavior.or(base.behavior),
            timezone: self.timezone.or(base.timezone),
            freeze_start: self.freeze_start.or(base.freeze_start),
            freeze_end: self.freeze_end.or(base.freeze_end),
            rrule: self.rrule.or(base.rrule),
            duration_minutes: self.duration_minutes.or(base.duration_minutes),
            allow_override_label: self.allow_override_label.or(base.allow_override_label),
            allow_override_actor: self.allow_override_actor.or(base.allow_override_actor),
            fail_message: self.fail_message.or(base.fail_message),
            summary: self.summary.or(base.summary),
        }
    }
}

/// Environment variable carrying an input, e.g. `INPUT_FREEZE_START`
pub fn input_variable(name: &str) -> String {
    format!("INPUT_{}", name.to_ascii_uppercase().replace(' ', "_"))
}
