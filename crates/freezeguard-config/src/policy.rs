//! Validated policy structures

use crate::rrule::RecurrenceRule;
use crate::schema::RawInputs;
use crate::validation::{
    ValidationError, parse_environment, parse_timezone_input, resolve_window,
};
use chrono_tz::Tz;
use freezeguard_util::Timestamp;
use std::fmt;

/// How an active, non-overridden freeze is enforced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Block,
    Warn,
    Allow,
    /// Any other configured value; enforced like `Allow`
    Unrecognized(String),
}

impl Behavior {
    /// Case-insensitive; unknown values are kept rather than rejected
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "block" => Behavior::Block,
            "warn" => Behavior::Warn,
            "allow" => Behavior::Allow,
            _ => Behavior::Unrecognized(value.trim().to_string()),
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Block => f.write_str("block"),
            Behavior::Warn => f.write_str("warn"),
            Behavior::Allow => f.write_str("allow"),
            Behavior::Unrecognized(value) => f.write_str(value),
        }
    }
}

/// The configured freeze window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSpec {
    /// No window: never frozen
    None,
    /// Explicit bounds, both inclusive
    Fixed { start: Timestamp, end: Timestamp },
    /// Each occurrence of `rule` freezes for `duration_minutes`
    Recurring {
        rule: RecurrenceRule,
        duration_minutes: u32,
    },
}

impl WindowSpec {
    /// Short name for logs and the validation tool
    pub fn kind(&self) -> &'static str {
        match self {
            WindowSpec::None => "none",
            WindowSpec::Fixed { .. } => "fixed",
            WindowSpec::Recurring { .. } => "recurring",
        }
    }
}

/// Validated freeze policy for one run
#[derive(Debug, Clone, PartialEq)]
pub struct FreezePolicy {
    pub environment: String,
    pub behavior: Behavior,
    pub timezone: Tz,
    pub window: WindowSpec,
    pub override_label: Option<String>,
    pub override_actor: Option<String>,
    pub fail_message: String,
    /// Write the run summary block
    pub summary: bool,
}

impl FreezePolicy {
    /// Validate and convert raw inputs, collecting every error found
    pub fn from_raw(raw: RawInputs) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let environment = parse_environment(&raw).map_err(|e| errors.push(e)).ok();
        let timezone = parse_timezone_input(&raw).map_err(|e| errors.push(e)).ok();
        let window = resolve_window(&raw).map_err(|e| errors.extend(e)).ok();

        let (Some(environment), Some(timezone), Some(window)) = (environment, timezone, window)
        else {
            return Err(errors);
        };

        let behavior = Behavior::parse(raw.behavior.as_deref().unwrap_or(crate::DEFAULT_BEHAVIOR));
        if let Behavior::Unrecognized(value) = &behavior {
            tracing::warn!(behavior = %value, "Unrecognized behavior, freezes will be allowed");
        }

        Ok(Self {
            environment,
            behavior,
            timezone,
            window,
            override_label: raw.allow_override_label,
            override_actor: raw.allow_override_actor,
            fail_message: raw
                .fail_message
                .unwrap_or_else(|| crate::DEFAULT_FAIL_MESSAGE.to_string()),
            summary: raw.summary.map(|flag| flag.is_enabled()).unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawFlag, RawNumber};

    #[test]
    fn test_defaults() {
        let raw = RawInputs {
            environment: Some("production".into()),
            ..Default::default()
        };
        let policy = FreezePolicy::from_raw(raw).unwrap();

        assert_eq!(policy.environment, "production");
        assert_eq!(policy.behavior, Behavior::Block);
        assert_eq!(policy.timezone, Tz::UTC);
        assert_eq!(policy.window, WindowSpec::None);
        assert_eq!(policy.fail_message, "Release freeze is active. Deployment prevented.");
        assert!(policy.summary);
        assert_eq!(policy.override_label, None);
        assert_eq!(policy.override_actor, None);
    }

    #[test]
    fn test_full_inputs() {
        let raw = RawInputs {
            environment: Some("production".into()),
            behavior: Some("WARN".into()),
            timezone: Some("America/New_York".into()),
            rrule: Some("FREQ=WEEKLY;BYDAY=FR".into()),
            duration_minutes: Some(RawNumber::Text("720".into())),
            allow_override_label: Some("hotfix-override".into()),
            allow_override_actor: Some("release-bot".into()),
            fail_message: Some("Weekend freeze".into()),
            summary: Some(RawFlag::Text("false".into())),
            ..Default::default()
        };
        let policy = FreezePolicy::from_raw(raw).unwrap();

        assert_eq!(policy.behavior, Behavior::Warn);
        assert_eq!(policy.timezone, Tz::America__New_York);
        assert_eq!(policy.window.kind(), "recurring");
        assert_eq!(policy.override_label.as_deref(), Some("hotfix-override"));
        assert_eq!(policy.override_actor.as_deref(), Some("release-bot"));
        assert_eq!(policy.fail_message, "Weekend freeze");
        assert!(!policy.summary);
    }

    #[test]
    fn test_behavior_parsing() {
        assert_eq!(Behavior::parse("block"), Behavior::Block);
        assert_eq!(Behavior::parse(" Warn "), Behavior::Warn);
        assert_eq!(Behavior::parse("ALLOW"), Behavior::Allow);
        assert_eq!(
            Behavior::parse("deny"),
            Behavior::Unrecognized("deny".into())
        );
        assert_eq!(Behavior::parse("deny").to_string(), "deny");
        assert_eq!(Behavior::Block.to_string(), "block");
    }

    #[test]
    fn test_unrecognized_behavior_is_not_fatal() {
        let raw = RawInputs {
            environment: Some("production".into()),
            behavior: Some("shout".into()),
            ..Default::default()
        };
        let policy = FreezePolicy::from_raw(raw).unwrap();
        assert_eq!(policy.behavior, Behavior::Unrecognized("shout".into()));
    }
}
