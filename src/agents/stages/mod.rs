//! Stage trait and the four pipeline stages
//!
//! Each stage reads the fields of the `IncidentContext` produced before it,
//! narrates through its `StageTracer`, and returns its own output. The
//! orchestrator records that output in the context; stages never write to
//! the context themselves.
//!
//! ## Stages
//!
//! 1. **Detection** - headline → `DetectionOutcome` (Alert / Clear)
//! 2. **Strategy** - `DetectionOutcome` → mitigation plan text
//! 3. **Governance** - plan → `Decision` (Approved / Rejected)
//! 4. **Execution** - approved plan → confirmation text (mutates the resource store)
//!
//! Swapping the rule-based logic for a model-backed one means implementing
//! `Stage` with the same `Output`; the orchestrator does not change.

pub mod detection;
pub mod execution;
pub mod governance;
pub mod strategy;

pub use detection::{
    CapabilityProbe, Classification, DetectionStage, KeywordClassifier, ThreatClassifier,
};
pub use execution::ExecutionStage;
pub use governance::{GovernancePolicy, GovernanceStage};
pub use strategy::StrategyStage;

use crate::capabilities::CapabilityError;
use crate::trace::{StageTracer, TraceClosed};
use crate::types::{Decision, DetectionOutcome, IncidentContext, StageId};
use async_trait::async_trait;
use std::sync::Arc;

/// Why a stage did not produce its output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// The trace consumer went away; stop the run.
    #[error(transparent)]
    Cancelled(#[from] TraceClosed),
    /// A context field was read before the stage that produces it ran.
    #[error("incident field `{0}` has not been produced yet")]
    MissingInput(&'static str),
    /// A collaborator failure the stage does not absorb.
    #[error(transparent)]
    Collaborator(#[from] CapabilityError),
}

/// One pluggable unit of pipeline logic
#[async_trait]
pub trait Stage: Send + Sync {
    type Output: Send;

    fn id(&self) -> StageId;

    /// One-line narration emitted when the stage starts
    fn describe(&self) -> &str;

    async fn evaluate(
        &self,
        ctx: &IncidentContext,
        tracer: &mut StageTracer<'_>,
    ) -> Result<Self::Output, StageError>;
}

pub type DetectionStageRef = Arc<dyn Stage<Output = DetectionOutcome>>;
pub type StrategyStageRef = Arc<dyn Stage<Output = String>>;
pub type GovernanceStageRef = Arc<dyn Stage<Output = Decision>>;
pub type ExecutionStageRef = Arc<dyn Stage<Output = String>>;
