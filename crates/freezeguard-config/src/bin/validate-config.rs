//! Config validation CLI tool
//!
//! Validates a freezeguard TOML input file and reports any errors.

use chrono_tz::Tz;
use freezeguard_config::{ConfigError, INPUT_NAMES, WindowSpec};
use freezeguard_util::Timestamp;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: validate-config <config-file>");
            eprintln!();
            eprintln!("Validates a freezeguard input file (TOML, same keys as the action inputs).");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config freeze.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    warn_unknown_keys(&config_path);

    match freezeguard_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Environment: {}", policy.environment);
            println!("  Behavior: {}", policy.behavior);
            println!("  Timezone: {}", policy.timezone.name());

            match &policy.window {
                WindowSpec::None => println!("  Window: none"),
                WindowSpec::Fixed { start, end } => {
                    println!("  Window: fixed");
                    println!("    Start: {}", describe_bound(start, &policy.timezone));
                    println!("    End: {}", describe_bound(end, &policy.timezone));
                }
                WindowSpec::Recurring {
                    rule,
                    duration_minutes,
                } => {
                    println!("  Window: recurring");
                    println!("    Frequency: {} (every {})", rule.frequency.as_str(), rule.interval);
                    println!("    Duration: {} minutes", duration_minutes);
                }
            }

            if let Some(label) = &policy.override_label {
                println!("  Override label: {}", label);
            }
            if let Some(actor) = &policy.override_actor {
                println!("  Override actor: {}", actor);
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - [{}] {}", err.field(), err);
                    }
                }
            }
            ExitCode::from(1)
        }
    }
}

fn describe_bound(bound: &Timestamp, tz: &Tz) -> String {
    let resolved = bound.in_zone(tz);
    if bound.is_naive() {
        format!("{resolved} (local time in {})", tz.name())
    } else {
        resolved.to_string()
    }
}

/// Unknown keys are ignored by the loader, so point them out here
fn warn_unknown_keys(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return;
    };
    for key in table.keys() {
        if !INPUT_NAMES.contains(&key.as_str()) {
            eprintln!("Warning: unknown key '{}' is ignored", key);
        }
    }
}
