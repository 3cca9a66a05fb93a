//! Execution Stage - applies an approved plan to the resource store
//!
//! The only stage with an external side effect. Items named in the alert
//! description are rerouted; when the description names none of the
//! region's stock, every item held there is rerouted.

use super::{Stage, StageError};
use crate::capabilities::{CapabilityError, ResourceStore};
use crate::trace::StageTracer;
use crate::types::{IncidentContext, StageId, StockStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct ExecutionStage {
    store: Arc<dyn ResourceStore>,
}

impl ExecutionStage {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Stage for ExecutionStage {
    type Output = String;

    fn id(&self) -> StageId {
        StageId::Execution
    }

    fn describe(&self) -> &str {
        "🚀 Executing autonomous database updates..."
    }

    async fn evaluate(
        &self,
        ctx: &IncidentContext,
        tracer: &mut StageTracer<'_>,
    ) -> Result<String, StageError> {
        match ctx.decision() {
            Some(decision) if decision.is_approved() => {}
            _ => return Err(StageError::MissingInput("approved decision")),
        }
        let detection = ctx.detection().ok_or(StageError::MissingInput("detection"))?;
        let region = detection
            .affected_region
            .as_deref()
            .ok_or(StageError::MissingInput("affected region"))?;

        let record = self
            .store
            .get(region)
            .await?
            .ok_or_else(|| CapabilityError::UnknownRegion(region.to_string()))?;

        let mut items: Vec<String> = record
            .stock_items()
            .filter(|item| detection.description.contains(item))
            .map(str::to_string)
            .collect();
        if items.is_empty() {
            items = record.stock_items().map(str::to_string).collect();
        }

        tracer
            .tool_call(format!(
                "update_inventory_status('{}', [{}])",
                region,
                items.join(", ")
            ))
            .await?;

        let updated = self.store.mark_rerouted(region, &items).await?;
        info!(
            region,
            warehouse = %updated.warehouse_id,
            items = items.len(),
            backend = self.store.backend_name(),
            "Resource store updated"
        );

        Ok(format!(
            "SUCCESS: Updated '{}' status for {} to '{}'.",
            updated.warehouse_id,
            items.join(", "),
            StockStatus::InTransitRerouted
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_stage;
    use super::*;
    use crate::storage::InMemoryResourceStore;
    use crate::types::{Decision, DetectionOutcome, DetectionStatus, RegionRecord, TraceKind};

    fn store() -> Arc<InMemoryResourceStore> {
        Arc::new(InMemoryResourceStore::from_records([
            (
                "Hamburg_Port".to_string(),
                RegionRecord::new("WH-HAM-99", ["Automotive Parts", "Steel"], 40),
            ),
            (
                "US_East_Coast".to_string(),
                RegionRecord::new("WH-ATL-01", ["Microchips", "Medical Supplies"], 85),
            ),
        ]))
    }

    fn approved_ctx(description: &str, region: Option<&str>) -> IncidentContext {
        let ctx = IncidentContext::new("headline");
        ctx.record_detection(DetectionOutcome {
            status: DetectionStatus::Alert,
            description: description.to_string(),
            affected_region: region.map(str::to_string),
        })
        .unwrap();
        ctx.record_plan("Plan: 1. Reroute.".to_string()).unwrap();
        ctx.record_decision(Decision::approved("ok")).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_named_items_are_rerouted() {
        let store = store();
        let stage = ExecutionStage::new(store.clone());
        let ctx = approved_ctx(
            "Labor Strike in Hamburg Port affecting Automotive Parts.",
            Some("Hamburg_Port"),
        );

        let (result, events) = run_stage(&stage, &ctx).await;
        assert_eq!(
            result.unwrap(),
            "SUCCESS: Updated 'WH-HAM-99' status for Automotive Parts to 'IN TRANSIT - REROUTED'."
        );
        assert_eq!(events[0].kind, TraceKind::ToolCall);

        let record = store.get("Hamburg_Port").await.unwrap().unwrap();
        assert_eq!(
            record.status_of("Automotive Parts"),
            Some(StockStatus::InTransitRerouted)
        );
        assert_eq!(record.status_of("Steel"), Some(StockStatus::InStock));
    }

    #[tokio::test]
    async fn test_whole_region_rerouted_when_no_item_named() {
        let store = store();
        let stage = ExecutionStage::new(store.clone());
        let ctx = approved_ctx(
            "Severe Weather (Storm Gamma) in Florida affecting Electronics.",
            Some("US_East_Coast"),
        );

        let (result, _) = run_stage(&stage, &ctx).await;
        assert!(result.unwrap().contains("Medical Supplies, Microchips"));

        let record = store.get("US_East_Coast").await.unwrap().unwrap();
        assert!(record
            .stock
            .values()
            .all(|s| *s == StockStatus::InTransitRerouted));
    }

    #[tokio::test]
    async fn test_unknown_region_is_a_collaborator_error() {
        let stage = ExecutionStage::new(store());
        let ctx = approved_ctx("Typhoon in Shenzhen.", Some("Shenzhen_Port"));

        let (result, events) = run_stage(&stage, &ctx).await;
        assert_eq!(
            result,
            Err(StageError::Collaborator(CapabilityError::UnknownRegion(
                "Shenzhen_Port".to_string()
            )))
        );
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_refuses_without_approval() {
        let stage = ExecutionStage::new(store());
        let ctx = IncidentContext::new("headline");
        ctx.record_decision(Decision::rejected("no")).unwrap();

        let (result, _) = run_stage(&stage, &ctx).await;
        assert_eq!(result, Err(StageError::MissingInput("approved decision")));
    }
}
