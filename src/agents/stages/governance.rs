//! Governance Stage - approves or rejects a drafted plan
//!
//! The policy is deliberately small: a plan must be non-empty, must stay
//! within a step budget, and must not mention any blocked term. Blocked
//! terms match case-insensitively.

use super::{Stage, StageError};
use crate::config::GovernanceConfig;
use crate::trace::StageTracer;
use crate::types::{Decision, IncidentContext, StageId};
use async_trait::async_trait;
use tracing::info;

const APPROVAL_RATIONALE: &str = "The plan is feasible and cost-effective.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernancePolicy {
    pub max_plan_steps: usize,
    pub blocked_terms: Vec<String>,
}

impl GovernancePolicy {
    pub fn new(max_plan_steps: usize, blocked_terms: Vec<String>) -> Self {
        Self {
            max_plan_steps,
            blocked_terms,
        }
    }

    /// Number of enumerated steps ("1.", "2.", ...) in a plan
    pub fn count_steps(plan: &str) -> usize {
        plan.split_whitespace()
            .filter(|token| {
                token
                    .strip_suffix('.')
                    .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            })
            .count()
    }

    pub fn review(&self, plan: &str) -> Decision {
        if plan.trim().is_empty() {
            return Decision::rejected("The plan is empty.");
        }

        let lowered = plan.to_lowercase();
        if let Some(term) = self
            .blocked_terms
            .iter()
            .find(|t| !t.is_empty() && lowered.contains(&t.to_lowercase()))
        {
            return Decision::rejected(format!("The plan relies on blocked action '{}'.", term));
        }

        let steps = Self::count_steps(plan);
        if steps > self.max_plan_steps {
            return Decision::rejected(format!(
                "The plan has {} steps; at most {} can be executed safely.",
                steps, self.max_plan_steps
            ));
        }

        Decision::approved(APPROVAL_RATIONALE)
    }
}

impl From<&GovernanceConfig> for GovernancePolicy {
    fn from(config: &GovernanceConfig) -> Self {
        Self::new(config.max_plan_steps, config.blocked_terms.clone())
    }
}

impl Default for GovernancePolicy {
    fn default() -> Self {
        Self::from(&GovernanceConfig::default())
    }
}

pub struct GovernanceStage {
    policy: GovernancePolicy,
}

impl GovernanceStage {
    pub fn new(policy: GovernancePolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Stage for GovernanceStage {
    type Output = Decision;

    fn id(&self) -> StageId {
        StageId::Governance
    }

    fn describe(&self) -> &str {
        "⚖️ Analyzing Plan Risk & Cost..."
    }

    async fn evaluate(
        &self,
        ctx: &IncidentContext,
        tracer: &mut StageTracer<'_>,
    ) -> Result<Decision, StageError> {
        let plan = ctx.plan().ok_or(StageError::MissingInput("plan"))?;

        tracer
            .log(format!(
                "Plan has {} step(s) (limit {}).",
                GovernancePolicy::count_steps(plan),
                self.policy.max_plan_steps
            ))
            .await?;

        let decision = self.policy.review(plan);
        info!(verdict = %decision.verdict, "Governance review complete");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_stage;
    use super::*;
    use crate::config::defaults::{GENERIC_MITIGATION_PLAN, HURRICANE_MITIGATION_PLAN};
    use crate::types::Verdict;

    #[test]
    fn test_count_steps() {
        assert_eq!(GovernancePolicy::count_steps(GENERIC_MITIGATION_PLAN), 3);
        assert_eq!(GovernancePolicy::count_steps(HURRICANE_MITIGATION_PLAN), 3);
        assert_eq!(GovernancePolicy::count_steps("Plan: wait it out."), 0);
        // A version number is not a step
        assert_eq!(GovernancePolicy::count_steps("Upgrade to 2.5 firmware."), 0);
    }

    #[test]
    fn test_reference_plans_are_approved() {
        let policy = GovernancePolicy::default();
        for plan in [GENERIC_MITIGATION_PLAN, HURRICANE_MITIGATION_PLAN] {
            let decision = policy.review(plan);
            assert!(decision.is_approved());
            assert_eq!(decision.rationale, APPROVAL_RATIONALE);
        }
    }

    #[test]
    fn test_rejections() {
        let policy = GovernancePolicy::new(2, vec!["air freight".to_string()]);

        assert_eq!(policy.review("   ").verdict, Verdict::Rejected);

        let blocked = policy.review("Plan: 1. Use AIR FREIGHT.");
        assert_eq!(blocked.verdict, Verdict::Rejected);
        assert!(blocked.rationale.contains("air freight"));

        let too_long = policy.review(HURRICANE_MITIGATION_PLAN);
        assert_eq!(too_long.verdict, Verdict::Rejected);
        assert!(too_long.rationale.contains("3 steps"));
    }

    #[tokio::test]
    async fn test_stage_reviews_recorded_plan() {
        let ctx = IncidentContext::new("headline");
        ctx.record_plan(GENERIC_MITIGATION_PLAN.to_string()).unwrap();

        let stage = GovernanceStage::new(GovernancePolicy::default());
        let (result, events) = run_stage(&stage, &ctx).await;

        assert!(result.unwrap().is_approved());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stage, StageId::Governance);
    }

    #[tokio::test]
    async fn test_stage_without_plan_fails() {
        let stage = GovernanceStage::new(GovernancePolicy::default());
        let (result, _) = run_stage(&stage, &IncidentContext::new("headline")).await;
        assert_eq!(result, Err(StageError::MissingInput("plan")));
    }
}
