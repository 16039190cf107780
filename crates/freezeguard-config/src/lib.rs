//! Configuration parsing and validation for freezeguard
//!
//! Inputs arrive as action environment variables, optionally layered over a
//! TOML file with the same keys. This crate provides:
//! - The raw input schema and environment lookup
//! - Validation with errors that name the offending input
//! - The validated [`FreezePolicy`] consumed by the core engine
//! - The recurrence rule grammar

mod policy;
mod rrule;
mod schema;
mod validation;

pub use policy::*;
pub use rrule::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Default enforcement when `behavior` is not set
pub const DEFAULT_BEHAVIOR: &str = "block";

/// Default zone when `timezone` is not set
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Default message when `fail_message` is not set
pub const DEFAULT_FAIL_MESSAGE: &str = "Release freeze is active. Deployment prevented.";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Read raw inputs from a TOML file
pub fn load_inputs_file(path: impl AsRef<Path>) -> ConfigResult<RawInputs> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate a policy from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<FreezePolicy> {
    parse_inputs(load_inputs_file(path)?)
}

/// Validate raw inputs into a policy
pub fn parse_inputs(raw: RawInputs) -> ConfigResult<FreezePolicy> {
    FreezePolicy::from_raw(raw).map_err(|errors| ConfigError::ValidationFailed { errors })
}
