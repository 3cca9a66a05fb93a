//! Incident Context and the stage outputs threaded through it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

// ============================================================================
// Detection
// ============================================================================

/// Whether an incoming signal threatens the monitored network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Alert,
    Clear,
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStatus::Alert => write!(f, "ALERT"),
            DetectionStatus::Clear => write!(f, "CLEAR"),
        }
    }
}

/// Output of the Detection stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    pub status: DetectionStatus,
    pub description: String,
    /// Resource-store region key of the affected site, if any
    pub affected_region: Option<String>,
}

impl DetectionOutcome {
    /// Fail-safe outcome for input that no rule recognises.
    pub fn no_impact() -> Self {
        Self {
            status: DetectionStatus::Clear,
            description: "No impact.".to_string(),
            affected_region: None,
        }
    }

    pub fn is_alert(&self) -> bool {
        self.status == DetectionStatus::Alert
    }
}

impl fmt::Display for DetectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.description)
    }
}

// ============================================================================
// Governance
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Approved => write!(f, "APPROVED"),
            Verdict::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Output of the Governance stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub rationale: String,
}

impl Decision {
    pub fn approved(rationale: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Approved,
            rationale: rationale.into(),
        }
    }

    pub fn rejected(rationale: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Rejected,
            rationale: rationale.into(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.verdict == Verdict::Approved
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.verdict, self.rationale)
    }
}

// ============================================================================
// Incident Context
// ============================================================================

/// Attempted to write a context field that a stage already produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("incident field `{0}` was already set")]
pub struct ContextError(pub &'static str);

/// Per-invocation record threaded through the pipeline.
///
/// Every output field is write-once. Stages only get `&IncidentContext`;
/// the orchestrator records each stage's output after the stage returns.
#[derive(Debug)]
pub struct IncidentContext {
    id: Uuid,
    raw_input: String,
    detection: OnceLock<DetectionOutcome>,
    plan: OnceLock<String>,
    decision: OnceLock<Decision>,
    execution_result: OnceLock<String>,
}

impl IncidentContext {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_input: raw_input.into(),
            detection: OnceLock::new(),
            plan: OnceLock::new(),
            decision: OnceLock::new(),
            execution_result: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn detection(&self) -> Option<&DetectionOutcome> {
        self.detection.get()
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.get().map(String::as_str)
    }

    pub fn decision(&self) -> Option<&Decision> {
        self.decision.get()
    }

    pub fn execution_result(&self) -> Option<&str> {
        self.execution_result.get().map(String::as_str)
    }

    pub fn record_detection(&self, outcome: DetectionOutcome) -> Result<(), ContextError> {
        self.detection.set(outcome).map_err(|_| ContextError("detection"))
    }

    pub fn record_plan(&self, plan: String) -> Result<(), ContextError> {
        self.plan.set(plan).map_err(|_| ContextError("plan"))
    }

    pub fn record_decision(&self, decision: Decision) -> Result<(), ContextError> {
        self.decision.set(decision).map_err(|_| ContextError("decision"))
    }

    pub fn record_execution_result(&self, result: String) -> Result<(), ContextError> {
        self.execution_result
            .set(result)
            .map_err(|_| ContextError("execution_result"))
    }
}
