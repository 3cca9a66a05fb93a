//! Shared data structures for the incident pipeline
//!
//! - IncidentContext and the stage outputs it accumulates
//!   (DetectionOutcome, plan text, Decision, execution result)
//! - TraceEvent, TraceKind, StageId and RunOutcome for the trace stream
//! - RegionRecord and StockStatus for the resource store

mod incident;
mod inventory;
mod trace;

pub use incident::*;
pub use inventory::*;
pub use trace::*;
