//! freezeguard - release freeze gate
//!
//! This is the entry point run as a workflow step. It wires together:
//! - Inputs from `INPUT_*` variables, optionally over a TOML file
//! - The run's trigger context and event payload
//! - The freeze engine
//! - Step outputs, the run summary and the exit code

mod output;

use anyhow::{Context, Result};
use clap::Parser;
use freezeguard_config::{ConfigError, RawInputs, load_inputs_file, parse_inputs};
use freezeguard_core::{FreezeEngine, FreezeReport, JsonFilePayload, TriggerContext};
use freezeguard_util::{FixedClock, SystemClock, TimeSource, parse_instant};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputWriter, append_summary};

/// freezeguard - Release freeze gate for deployment workflows
#[derive(Parser, Debug)]
#[command(name = "freezeguard")]
#[command(about = "Release freeze gate for deployment workflows", long_about = None)]
struct Args {
    /// TOML file with inputs; INPUT_* variables take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Step output file
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// Run summary file
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    summary_file: Option<PathBuf>,

    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: Option<String>,

    /// Webhook payload of the triggering event
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    #[arg(long, env = "GITHUB_ACTOR")]
    actor: Option<String>,

    /// Evaluate at this RFC 3339 instant instead of the current time
    #[arg(long, env = "FREEZEGUARD_MOCK_TIME")]
    now: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; stdout carries workflow commands
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "freezeguard starting");

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            print_fatal(&e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<u8> {
    let file_inputs = match &args.config {
        Some(path) => load_inputs_file(path)
            .with_context(|| format!("Failed to load inputs from {}", path.display()))?,
        None => RawInputs::default(),
    };
    let raw = RawInputs::from_lookup(|name| std::env::var(name).ok()).merged_over(file_inputs);
    let policy = parse_inputs(raw)?;

    let clock: Box<dyn TimeSource> = match non_blank(args.now.clone()) {
        Some(value) => {
            let instant = parse_instant(&value).context("Invalid mock time")?;
            info!(%instant, "Using fixed evaluation time");
            Box::new(FixedClock::new(instant))
        }
        None => Box::new(SystemClock),
    };

    let trigger = TriggerContext::new(
        non_blank(args.event_name.clone()),
        non_blank(args.actor.clone()),
    );
    let payload = JsonFilePayload::new(non_empty_path(args.event_path.clone()));

    let report = FreezeEngine::new(policy).evaluate(clock.as_ref(), &trigger, &payload);
    publish(args, &report)?;

    Ok(report.exit_code())
}

/// Print annotations, then write outputs and the summary
fn publish(args: &Args, report: &FreezeReport) -> Result<()> {
    for annotation in report.annotations() {
        println!("{annotation}");
    }

    OutputWriter::new(non_empty_path(args.output_file.clone())).write_all(&report.outputs())?;

    if report.summary_enabled {
        match non_empty_path(args.summary_file.clone()) {
            Some(path) => append_summary(&path, &report.summary_markdown())?,
            None => debug!("No summary file configured"),
        }
    }

    Ok(())
}

fn print_fatal(err: &anyhow::Error) {
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::ValidationFailed { errors }) => {
            for e in errors {
                println!("::error::{e}");
            }
        }
        _ => println!("::error::{err:#}"),
    }
    error!(error = %format!("{err:#}"), "freezeguard failed");
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_empty_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}
