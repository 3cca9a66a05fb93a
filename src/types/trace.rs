//! Trace events, stage identities and run outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the pipeline emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    System,
    Detection,
    Strategy,
    Governance,
    Execution,
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageId::System => write!(f, "System"),
            StageId::Detection => write!(f, "Detection"),
            StageId::Strategy => write!(f, "Strategy"),
            StageId::Governance => write!(f, "Governance"),
            StageId::Execution => write!(f, "Execution"),
        }
    }
}

/// Terminal classification of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    CompleteClear,
    CompleteExecuted,
    Rejected,
    Failed,
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::CompleteClear => "COMPLETE-CLEAR",
            RunOutcome::CompleteExecuted => "COMPLETE-EXECUTED",
            RunOutcome::Rejected => "REJECTED",
            RunOutcome::Failed => "FAILED",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Event category. Consumers branch on this, never on message decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceKind {
    Log,
    ToolCall,
    MemoryRecall,
    Terminal { outcome: RunOutcome },
}

impl TraceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceKind::Log => "log",
            TraceKind::ToolCall => "tool_call",
            TraceKind::MemoryRecall => "memory_recall",
            TraceKind::Terminal { .. } => "terminal",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TraceKind::Terminal { .. })
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        match self {
            TraceKind::Terminal { outcome } => Some(*outcome),
            _ => None,
        }
    }
}

/// One timestamped observation of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub stage: StageId,
    #[serde(flatten)]
    pub kind: TraceKind,
    pub message: String,
}

impl TraceEvent {
    /// Render as a single `[HH:MM:SS] ...` trace line.
    pub fn render_line(&self) -> String {
        let ts = self.timestamp.format("%H:%M:%S");
        match self.kind {
            TraceKind::Log => format!("[{}] [{}] {}", ts, self.stage, self.message),
            TraceKind::ToolCall => format!("[{}]    > 🛠️ Tool Call: {}", ts, self.message),
            TraceKind::MemoryRecall => {
                format!("[{}]    > 🧠 Memory Recall: {}", ts, self.message)
            }
            TraceKind::Terminal { outcome } => {
                format!("[{}] 🏁 [{}] {}", ts, outcome, self.message)
            }
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_line())
    }
}
