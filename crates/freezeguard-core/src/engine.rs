//! Freeze evaluation engine

use chrono::{DateTime, Utc};
use freezeguard_config::{ConfigResult, FreezePolicy, RawInputs, parse_inputs};
use freezeguard_util::TimeSource;
use tracing::info;

use crate::{
    EventPayloadSource, FreezeReport, OverrideResolver, OverrideResult, TriggerContext, decide,
    evaluate_window,
};

/// Evaluates one validated policy
#[derive(Debug, Clone)]
pub struct FreezeEngine {
    policy: FreezePolicy,
}

impl FreezeEngine {
    pub fn new(policy: FreezePolicy) -> Self {
        info!(
            environment = %policy.environment,
            window = policy.window.kind(),
            behavior = %policy.behavior,
            timezone = policy.timezone.name(),
            "Freeze engine initialized"
        );
        Self { policy }
    }

    pub fn policy(&self) -> &FreezePolicy {
        &self.policy
    }

    /// Evaluate at the clock's current instant
    pub fn evaluate(
        &self,
        clock: &dyn TimeSource,
        trigger: &TriggerContext,
        payload: &dyn EventPayloadSource,
    ) -> FreezeReport {
        self.evaluate_at(clock.now_utc(), trigger, payload)
    }

    pub fn evaluate_at(
        &self,
        now_utc: DateTime<Utc>,
        trigger: &TriggerContext,
        payload: &dyn EventPayloadSource,
    ) -> FreezeReport {
        let policy = &self.policy;
        let now_local = now_utc.with_timezone(&policy.timezone);
        info!(
            environment = %policy.environment,
            now_local = %now_local,
            now_utc = %now_utc,
            "Checking freeze"
        );

        let evaluation = evaluate_window(&policy.window, &now_local);

        let overrides = if evaluation.is_frozen {
            OverrideResolver::from_policy(policy).resolve(trigger, payload)
        } else {
            OverrideResult::default()
        };

        let decision = decide(
            evaluation.is_frozen,
            overrides.overridden,
            &policy.behavior,
            &policy.fail_message,
        );

        let reason = if evaluation.is_frozen && overrides.overridden {
            format!("Frozen but overridden: {}", overrides.reason)
        } else {
            evaluation.reason.clone()
        };

        info!(
            is_frozen = evaluation.is_frozen,
            overridden = overrides.overridden,
            decision = %decision.verdict,
            reason = %reason,
            "Freeze evaluated"
        );

        FreezeReport {
            environment: policy.environment.clone(),
            now_local,
            now_utc,
            evaluation,
            overrides,
            decision,
            reason,
            fail_message: policy.fail_message.clone(),
            summary_enabled: policy.summary,
        }
    }
}

/// Validate raw inputs and evaluate them in one step
pub fn evaluate_inputs(
    raw: RawInputs,
    clock: &dyn TimeSource,
    trigger: &TriggerContext,
    payload: &dyn EventPayloadSource,
) -> ConfigResult<FreezeReport> {
    let policy = parse_inputs(raw)?;
    Ok(FreezeEngine::new(policy).evaluate(clock, trigger, payload))
}
