//! Input validation
//!
//! Every error names the input it came from. Window validation runs before
//! any time evaluation, so a conflicting configuration can never be
//! evaluated.

use crate::policy::WindowSpec;
use crate::rrule::RecurrenceRule;
use crate::schema::{RawInputs, RawNumber};
use chrono_tz::Tz;
use freezeguard_util::{FreezeError, Timestamp, parse_timestamp, parse_timezone};
use thiserror::Error;

/// Validation error
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Input '{0}' is required")]
    MissingInput(&'static str),

    #[error("Input '{field}' is invalid: {source}")]
    InvalidInput {
        field: &'static str,
        source: FreezeError,
    },

    #[error("Input '{field}' is invalid: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("Cannot specify both fixed window (freeze_start/freeze_end) and recurring window (rrule)")]
    ConflictingWindows,

    #[error("Input 'duration_minutes' is required when using 'rrule'")]
    MissingDuration,
}

impl ValidationError {
    /// The input that caused this error
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingInput(field) => *field,
            ValidationError::InvalidInput { field, .. } => *field,
            ValidationError::InvalidValue { field, .. } => *field,
            ValidationError::ConflictingWindows => "rrule",
            ValidationError::MissingDuration => "duration_minutes",
        }
    }
}

pub(crate) fn parse_environment(raw: &RawInputs) -> Result<String, ValidationError> {
    raw.environment
        .as_ref()
        .map(|env| env.trim())
        .filter(|env| !env.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingInput("environment"))
}

pub(crate) fn parse_timezone_input(raw: &RawInputs) -> Result<Tz, ValidationError> {
    let name = raw.timezone.as_deref().unwrap_or(crate::DEFAULT_TIMEZONE);
    parse_timezone(name).map_err(|source| ValidationError::InvalidInput {
        field: "timezone",
        source,
    })
}

/// Parse a positive whole number of minutes
pub fn parse_duration_minutes(raw: &RawNumber) -> Result<u32, String> {
    let value = match raw {
        RawNumber::Integer(n) => *n,
        RawNumber::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("expected a whole number of minutes, got '{text}'"))?,
    };

    if value <= 0 {
        return Err(format!("must be a positive number of minutes, got {value}"));
    }
    u32::try_from(value).map_err(|_| format!("{value} minutes is too long"))
}

/// Resolve which freeze window, if any, the inputs describe.
///
/// Fixed and recurring inputs are mutually exclusive; supplying both is
/// reported on its own, without looking at the individual values.
pub(crate) fn resolve_window(raw: &RawInputs) -> Result<WindowSpec, Vec<ValidationError>> {
    let has_fixed = raw.freeze_start.is_some() || raw.freeze_end.is_some();

    if has_fixed && raw.rrule.is_some() {
        return Err(vec![ValidationError::ConflictingWindows]);
    }

    if let Some(rule_text) = &raw.rrule {
        let mut errors = Vec::new();

        let duration = match &raw.duration_minutes {
            None => {
                errors.push(ValidationError::MissingDuration);
                None
            }
            Some(value) => match parse_duration_minutes(value) {
                Ok(minutes) => Some(minutes),
                Err(message) => {
                    errors.push(ValidationError::InvalidValue {
                        field: "duration_minutes",
                        message,
                    });
                    None
                }
            },
        };

        let rule = match RecurrenceRule::parse(rule_text) {
            Ok(rule) => Some(rule),
            Err(source) => {
                errors.push(ValidationError::InvalidInput {
                    field: "rrule",
                    source,
                });
                None
            }
        };

        return match (rule, duration) {
            (Some(rule), Some(duration_minutes)) if errors.is_empty() => {
                Ok(WindowSpec::Recurring {
                    rule,
                    duration_minutes,
                })
            }
            _ => Err(errors),
        };
    }

    match (raw.freeze_start.as_deref(), raw.freeze_end.as_deref()) {
        (Some(start), Some(end)) => {
            let start = parse_bound(start, "freeze_start");
            let end = parse_bound(end, "freeze_end");
            match (start, end) {
                (Ok(start), Ok(end)) => Ok(WindowSpec::Fixed { start, end }),
                (start, end) => Err(start.err().into_iter().chain(end.err()).collect()),
            }
        }
        // A fixed window needs both bounds; one alone configures nothing
        (Some(_), None) | (None, Some(_)) => {
            let missing = if raw.freeze_start.is_none() {
                "freeze_start"
            } else {
                "freeze_end"
            };
            tracing::warn!(missing, "Fixed window is missing a bound, ignoring it");
            Ok(WindowSpec::None)
        }
        (None, None) => Ok(WindowSpec::None),
    }
}

fn parse_bound(value: &str, field: &'static str) -> Result<Timestamp, ValidationError> {
    parse_timestamp(value).map_err(|source| ValidationError::InvalidInput { field, source })
}
