//! Event payload access
//!
//! The label override needs the labels of the triggering pull request. They
//! come from the webhook payload the runner writes to disk, read through
//! [`EventPayloadSource`] so the engine never touches the filesystem itself.

use freezeguard_util::{FreezeError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Supplies pull request labels for the current event
pub trait EventPayloadSource {
    fn pull_request_labels(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<PullRequest>,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

/// Extract label names from a webhook payload. A payload without a pull
/// request has no labels.
pub fn parse_pull_request_labels(json: &str) -> Result<Vec<String>> {
    let payload: EventPayload = serde_json::from_str(json)
        .map_err(|e| FreezeError::payload(format!("malformed event payload: {e}")))?;

    Ok(payload
        .pull_request
        .map(|pr| pr.labels.into_iter().map(|label| label.name).collect())
        .unwrap_or_default())
}

/// Payload read from a JSON file on demand
#[derive(Debug, Clone, Default)]
pub struct JsonFilePayload {
    path: Option<PathBuf>,
}

impl JsonFilePayload {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl EventPayloadSource for JsonFilePayload {
    fn pull_request_labels(&self) -> Result<Vec<String>> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| FreezeError::payload("event payload path is not set"))?;
        let content = std::fs::read_to_string(path)?;
        parse_pull_request_labels(&content)
    }
}

/// Labels known up front
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLabels(pub Vec<String>);

impl EventPayloadSource for StaticLabels {
    fn pull_request_labels(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}
