//! Strategy Stage - drafts a mitigation plan for an alert

use super::{Stage, StageError};
use crate::capabilities::MemoryRecall;
use crate::trace::StageTracer;
use crate::types::{IncidentContext, StageId};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Recalls a past plan keyed by the alert description, falling back to a
/// standard playbook when memory has nothing (or is unavailable).
///
/// Exactly one MemoryRecall event, naming the recall key, is emitted per
/// evaluation and it precedes the query. The hit or miss follows as a Log.
pub struct StrategyStage {
    memory: Arc<dyn MemoryRecall>,
    fallback_plan: String,
}

impl StrategyStage {
    pub fn new(memory: Arc<dyn MemoryRecall>, fallback_plan: impl Into<String>) -> Self {
        Self {
            memory,
            fallback_plan: fallback_plan.into(),
        }
    }
}

#[async_trait]
impl Stage for StrategyStage {
    type Output = String;

    fn id(&self) -> StageId {
        StageId::Strategy
    }

    fn describe(&self) -> &str {
        "⚙️ Consulting Memory Bank..."
    }

    async fn evaluate(
        &self,
        ctx: &IncidentContext,
        tracer: &mut StageTracer<'_>,
    ) -> Result<String, StageError> {
        let detection = ctx.detection().ok_or(StageError::MissingInput("detection"))?;

        let key = detection.description.as_str();
        tracer.memory_recall(format!("recall('{}')", key)).await?;

        match self.memory.recall(key).await {
            Ok(Some(plan)) => {
                debug!("Memory hit for alert");
                tracer
                    .log("Found successful mitigation strategy from past event.")
                    .await?;
                Ok(plan)
            }
            Ok(None) => {
                tracer
                    .log("No comparable past event; using standard playbook.")
                    .await?;
                Ok(self.fallback_plan.clone())
            }
            Err(e) => {
                warn!(error = %e, "Memory recall failed, using standard playbook");
                tracer
                    .warn(format!("recall failed: {} (using standard playbook)", e))
                    .await?;
                Ok(self.fallback_plan.clone())
            }
        }
    }
}
