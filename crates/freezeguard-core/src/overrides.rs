//! Freeze overrides
//!
//! Two mechanisms can lift an active freeze, checked label first, then
//! actor. The first match wins.

use freezeguard_config::FreezePolicy;
use tracing::{debug, info, warn};

use crate::EventPayloadSource;

/// The only event whose labels can lift a freeze
const PULL_REQUEST_EVENT: &str = "pull_request";

/// What triggered the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerContext {
    pub event_name: Option<String>,
    pub actor: Option<String>,
}

impl TriggerContext {
    pub fn new(event_name: Option<String>, actor: Option<String>) -> Self {
        Self { event_name, actor }
    }

    pub fn is_pull_request(&self) -> bool {
        self.event_name
            .as_deref()
            .is_some_and(|name| name == PULL_REQUEST_EVENT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideResult {
    pub overridden: bool,
    /// Empty unless overridden
    pub reason: String,
    /// Non-fatal problems met while checking
    pub warnings: Vec<String>,
}

impl OverrideResult {
    fn applied(reason: String) -> Self {
        info!(reason = %reason, "Override applied");
        Self {
            overridden: true,
            reason,
            warnings: Vec::new(),
        }
    }
}

/// Checks the configured override mechanisms against a trigger
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideResolver<'a> {
    label: Option<&'a str>,
    actor: Option<&'a str>,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(label: Option<&'a str>, actor: Option<&'a str>) -> Self {
        Self { label, actor }
    }

    pub fn from_policy(policy: &'a FreezePolicy) -> Self {
        Self::new(
            policy.override_label.as_deref(),
            policy.override_actor.as_deref(),
        )
    }

    /// Only call this while frozen
    pub fn resolve(
        &self,
        trigger: &TriggerContext,
        payload: &dyn EventPayloadSource,
    ) -> OverrideResult {
        let mut warnings = Vec::new();

        if let Some(label) = self.label
            && trigger.is_pull_request()
        {
            match payload.pull_request_labels() {
                Ok(labels) if labels.iter().any(|l| l == label) => {
                    return OverrideResult::applied(format!("PR label '{label}' matched"));
                }
                Ok(labels) => {
                    debug!(label, ?labels, "Override label not present on pull request");
                }
                Err(e) => {
                    warn!(error = %e, "Skipping label override");
                    warnings.push(format!("Failed to read event payload for label check: {e}"));
                }
            }
        }

        if let Some(allowed) = self.actor
            && trigger.actor.as_deref() == Some(allowed)
        {
            let mut result =
                OverrideResult::applied(format!("Actor '{allowed}' is allowed to override"));
            result.warnings = warnings;
            return result;
        }

        OverrideResult {
            overridden: false,
            reason: String::new(),
            warnings,
        }
    }
}
