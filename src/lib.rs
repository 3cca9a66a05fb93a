//! Supply Chain Sentinel: staged supply-chain incident response
//!
//! A raw news headline flows through four stages, each narrating what it does
//! into an ordered trace that the caller consumes while the run progresses.
//!
//! ## Architecture
//!
//! - **Agents**: `IncidentOrchestrator` and the Detection, Strategy,
//!   Governance and Execution stages
//! - **Trace**: bounded producer/consumer channel of `TraceEvent`s
//! - **Capabilities**: inventory, weather, memory and resource-store traits
//! - **Storage**: in-memory and sled-backed resource stores
//! - **API**: axum server streaming traces as Server-Sent Events

pub mod agents;
pub mod api;
pub mod capabilities;
pub mod config;
pub mod storage;
pub mod trace;
pub mod types;

// Re-export configuration
pub use config::SentinelConfig;

// Re-export commonly used types
pub use types::{
    Decision, DetectionOutcome, DetectionStatus, IncidentContext, RegionRecord, RunOutcome,
    StageId, StockStatus, TraceEvent, TraceKind, Verdict,
};

// Re-export the pipeline
pub use agents::{IncidentOrchestrator, IncidentReport, Stage, StageError, StatsSnapshot};
pub use trace::{TraceClosed, TraceSink, TraceStream};
