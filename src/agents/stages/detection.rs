//! Detection Stage - decides whether a headline threatens the network
//!
//! Classification and consultation are separate concerns:
//! - a `ThreatClassifier` picks the capabilities worth probing and the
//!   Alert/Clear outcome from the headline alone
//! - the stage then probes each capability, narrating every call as a
//!   ToolCall event
//!
//! Probe results are advisory: they are logged and never change the outcome.
//! A failing probe becomes a warning Log event and is absorbed.

use super::{Stage, StageError};
use crate::capabilities::{InventoryLookup, WeatherLookup};
use crate::config::ThreatRule;
use crate::trace::StageTracer;
use crate::types::{DetectionOutcome, IncidentContext, StageId};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Classification
// ============================================================================

/// A capability the Detection stage should consult
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityProbe {
    Inventory { region: String },
    Weather { location: String },
}

impl CapabilityProbe {
    /// Tool-call narration, e.g. `check_inventory('Hamburg_Port')`
    pub fn call_signature(&self) -> String {
        match self {
            CapabilityProbe::Inventory { region } => format!("check_inventory('{}')", region),
            CapabilityProbe::Weather { location } => {
                format!("check_severe_weather('{}')", location)
            }
        }
    }
}

/// Result of classifying one headline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Probes in the order they should run
    pub probes: Vec<CapabilityProbe>,
    /// `None` when the headline is unclassifiable
    pub outcome: Option<DetectionOutcome>,
}

/// Pluggable decision rule for Detection
pub trait ThreatClassifier: Send + Sync {
    fn classify(&self, raw_input: &str) -> Classification;
}

/// Exact, case-sensitive substring match against a fixed vocabulary.
///
/// Every matching rule contributes its probes. The first matching rule in
/// configuration order decides the outcome, so one headline yields at most
/// one alert.
pub struct KeywordClassifier {
    rules: Vec<ThreatRule>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<ThreatRule>) -> Self {
        Self { rules }
    }

    fn matches(rule: &ThreatRule, raw_input: &str) -> bool {
        rule.keywords
            .iter()
            .any(|k| !k.is_empty() && raw_input.contains(k.as_str()))
    }
}

impl ThreatClassifier for KeywordClassifier {
    fn classify(&self, raw_input: &str) -> Classification {
        let mut classification = Classification::default();

        for rule in self.rules.iter().filter(|r| Self::matches(r, raw_input)) {
            debug!(rule = %rule.name, "Threat rule matched");

            if rule.check_inventory {
                let region = rule.region.clone().unwrap_or_else(|| rule.location.clone());
                push_unique(&mut classification.probes, CapabilityProbe::Inventory { region });
            }
            if rule.check_weather {
                push_unique(
                    &mut classification.probes,
                    CapabilityProbe::Weather {
                        location: rule.location.clone(),
                    },
                );
            }

            if classification.outcome.is_none() {
                classification.outcome = Some(DetectionOutcome {
                    status: rule.status,
                    description: rule.description.clone(),
                    affected_region: rule.region.clone(),
                });
            }
        }

        classification
    }
}

fn push_unique(probes: &mut Vec<CapabilityProbe>, probe: CapabilityProbe) {
    if !probes.contains(&probe) {
        probes.push(probe);
    }
}

// ============================================================================
// Stage
// ============================================================================

pub struct DetectionStage {
    classifier: Arc<dyn ThreatClassifier>,
    inventory: Arc<dyn InventoryLookup>,
    weather: Arc<dyn WeatherLookup>,
}

impl DetectionStage {
    pub fn new(
        classifier: Arc<dyn ThreatClassifier>,
        inventory: Arc<dyn InventoryLookup>,
        weather: Arc<dyn WeatherLookup>,
    ) -> Self {
        Self {
            classifier,
            inventory,
            weather,
        }
    }

    async fn consult(
        &self,
        probe: &CapabilityProbe,
        tracer: &mut StageTracer<'_>,
    ) -> Result<(), StageError> {
        tracer.tool_call(probe.call_signature()).await?;

        let result = match probe {
            CapabilityProbe::Inventory { region } => self.inventory.check_inventory(region).await,
            CapabilityProbe::Weather { location } => self.weather.check_weather(location).await,
        };

        match result {
            Ok(text) => tracer.log(format!("  ↳ {}", text)).await?,
            Err(e) => {
                let call = probe.call_signature();
                warn!(probe = %call, error = %e, "Capability unavailable, continuing");
                tracer
                    .warn(format!("{} failed: {} (continuing without it)", call, e))
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for DetectionStage {
    type Output = DetectionOutcome;

    fn id(&self) -> StageId {
        StageId::Detection
    }

    fn describe(&self) -> &str {
        "📡 Scanning news feed and consulting internal tools..."
    }

    async fn evaluate(
        &self,
        ctx: &IncidentContext,
        tracer: &mut StageTracer<'_>,
    ) -> Result<DetectionOutcome, StageError> {
        let classification = self.classifier.classify(ctx.raw_input());

        for probe in &classification.probes {
            self.consult(probe, tracer).await?;
        }

        Ok(classification.outcome.unwrap_or_else(|| {
            debug!("Headline unclassifiable, defaulting to Clear");
            DetectionOutcome::no_impact()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_stage;
    use super::*;
    use crate::capabilities::{CapabilityError, StaticWeatherService, StoreInventoryLookup};
    use crate::config::DetectionConfig;
    use crate::storage::InMemoryResourceStore;
    use crate::types::{DetectionStatus, TraceKind};

    struct DownInventory;

    #[async_trait]
    impl InventoryLookup for DownInventory {
        async fn check_inventory(&self, _region: &str) -> Result<String, CapabilityError> {
            Err(CapabilityError::unavailable("inventory", "connection refused"))
        }
    }

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(DetectionConfig::default().rules)
    }

    fn stage_with(inventory: Arc<dyn InventoryLookup>) -> DetectionStage {
        DetectionStage::new(
            Arc::new(classifier()),
            inventory,
            Arc::new(StaticWeatherService::default()),
        )
    }

    fn stage() -> DetectionStage {
        stage_with(Arc::new(StoreInventoryLookup::new(Arc::new(
            InMemoryResourceStore::new(),
        ))))
    }

    #[test]
    fn test_hamburg_headline_alerts() {
        let c = classifier().classify("BREAKING: Major labor strike declared at Hamburg Port.");
        let outcome = c.outcome.unwrap();
        assert_eq!(outcome.status, DetectionStatus::Alert);
        assert!(outcome.description.contains("Automotive Parts"));
        assert_eq!(outcome.affected_region.as_deref(), Some("Hamburg_Port"));
        assert_eq!(
            c.probes,
            vec![CapabilityProbe::Inventory {
                region: "Hamburg_Port".to_string()
            }]
        );
    }

    #[test]
    fn test_florida_headline_probes_inventory_and_weather() {
        let c = classifier().classify("URGENT: Hurricane Warning issued for Florida Coast.");
        assert_eq!(c.probes.len(), 2);
        assert_eq!(
            c.probes[1],
            CapabilityProbe::Weather {
                location: "Florida".to_string()
            }
        );
        assert!(c.outcome.unwrap().description.contains("Electronics"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        // "strikes" must not trip the "Strike" keyword
        let c = classifier().classify("BREAKING: 7.0 Magnitude Earthquake strikes Tokyo.");
        let outcome = c.outcome.unwrap();
        assert_eq!(outcome.status, DetectionStatus::Clear);
        assert!(outcome.description.contains("No active inventory"));
    }

    #[test]
    fn test_first_matching_rule_decides_when_signals_overlap() {
        let c = classifier().classify("Hamburg dockers join Florida Hurricane relief");
        assert!(c.outcome.unwrap().description.contains("Hamburg"));
        // Probes from both rules are still collected
        assert_eq!(c.probes.len(), 3);
    }

    #[test]
    fn test_unrelated_headline_is_unclassifiable() {
        let c = classifier().classify("Local bake sale happening in Ohio.");
        assert!(c.outcome.is_none());
        assert!(c.probes.is_empty());
    }

    #[tokio::test]
    async fn test_unclassifiable_defaults_to_clear_without_tool_calls() {
        let ctx = IncidentContext::new("Local bake sale happening in Ohio.");
        let (result, events) = run_stage(&stage(), &ctx).await;
        assert_eq!(result.unwrap(), DetectionOutcome::no_impact());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_tool_calls_precede_result_and_are_attributed() {
        let ctx = IncidentContext::new("URGENT: Hurricane Warning issued for Florida Coast.");
        let (result, events) = run_stage(&stage(), &ctx).await;
        assert!(result.unwrap().is_alert());

        let tool_calls: Vec<&str> = events
            .iter()
            .filter(|e| e.kind == TraceKind::ToolCall)
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            tool_calls,
            vec!["check_inventory('US_East_Coast')", "check_severe_weather('Florida')"]
        );
        assert!(events.iter().all(|e| e.stage == StageId::Detection));
    }

    #[tokio::test]
    async fn test_capability_failure_is_absorbed_as_warning() {
        let ctx = IncidentContext::new("Major labor strike declared at Hamburg Port.");
        let (result, events) = run_stage(&stage_with(Arc::new(DownInventory)), &ctx).await;

        let outcome = result.unwrap();
        assert_eq!(outcome.status, DetectionStatus::Alert);
        assert_eq!(events[0].kind, TraceKind::ToolCall);
        assert_eq!(events[1].kind, TraceKind::Log);
        assert!(events[1].message.contains("connection refused"));
    }
}
