//! Incident pipeline: the orchestrator and its four stages
//!
//! ## Stages
//!
//! 1. **Detection** - is the headline a threat to our network?
//! 2. **Strategy** - which mitigation plan fits the alert?
//! 3. **Governance** - may the plan be executed?
//! 4. **Execution** - apply the plan to the resource store
//!
//! The orchestrator only sequences stages and branches on their outputs;
//! every collaborator call happens inside a stage.

pub mod orchestrator;
pub mod stages;

pub use orchestrator::{IncidentOrchestrator, IncidentReport, OrchestratorStats, StatsSnapshot};
pub use stages::{Stage, StageError};
