//! Orchestrator - drives one incident through the four stages
//!
//! The orchestrator owns control flow only. It never calls a collaborator
//! directly; stages do. For every invocation it creates a fresh
//! `IncidentContext`, runs the stages in order, records each output in the
//! context, and ends the trace with exactly one Terminal event.
//!
//! ## Flow
//!
//! ```text
//! Detection ──Clear──▶ 🏁 COMPLETE-CLEAR
//!     │ Alert
//!     ▼
//! Strategy
//!     ▼
//! Governance ──Rejected──▶ 🏁 REJECTED
//!     │ Approved
//!     ▼
//! Execution ──error──▶ 🏁 FAILED
//!     │ ok
//!     ▼
//! 🏁 COMPLETE-EXECUTED
//! ```
//!
//! A stage error anywhere maps to FAILED, so a run always terminates in one of
//! the four outcomes. The only exception is cancellation: once the consumer
//! drops its stream, the run stops without a Terminal event and the remaining
//! stages (in particular Execution) never run.

use super::stages::{
    DetectionStage, DetectionStageRef, ExecutionStage, ExecutionStageRef, GovernancePolicy,
    GovernanceStage, GovernanceStageRef, KeywordClassifier, Stage, StageError, StrategyStage,
    StrategyStageRef,
};
use crate::capabilities::{MemoryRecall, ResourceStore, StoreInventoryLookup, WeatherLookup};
use crate::config::{defaults, SentinelConfig};
use crate::trace::{self, Clock, StageTracer, TraceClosed, TraceSink, TraceStream};
use crate::types::{IncidentContext, RunOutcome, StageId, TraceEvent};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

// ============================================================================
// Statistics
// ============================================================================

/// Run counters shared by every clone of an orchestrator
#[derive(Debug, Default)]
pub struct OrchestratorStats {
    started: AtomicU64,
    complete_clear: AtomicU64,
    complete_executed: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

/// Point-in-time copy of [`OrchestratorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub started: u64,
    pub complete_clear: u64,
    pub complete_executed: u64,
    pub rejected: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl StatsSnapshot {
    /// Runs that reached a Terminal event
    pub fn finished(&self) -> u64 {
        self.complete_clear + self.complete_executed + self.rejected + self.failed
    }
}

impl OrchestratorStats {
    fn record(&self, outcome: Option<RunOutcome>) {
        let counter = match outcome {
            Some(RunOutcome::CompleteClear) => &self.complete_clear,
            Some(RunOutcome::CompleteExecuted) => &self.complete_executed,
            Some(RunOutcome::Rejected) => &self.rejected,
            Some(RunOutcome::Failed) => &self.failed,
            None => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            complete_clear: self.complete_clear.load(Ordering::Relaxed),
            complete_executed: self.complete_executed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Everything one run produced, for callers that do not need streaming
#[derive(Debug, Clone)]
pub struct IncidentReport {
    pub incident_id: Uuid,
    pub events: Vec<TraceEvent>,
    /// `None` only if the run was cut short without a Terminal event
    pub outcome: Option<RunOutcome>,
}

impl IncidentReport {
    /// Rendered trace, one line per event
    pub fn render(&self) -> String {
        self.events
            .iter()
            .map(TraceEvent::render_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Stage pipeline for supply-chain incidents.
///
/// Cheap to clone; clones share stages, collaborators and statistics, so one
/// instance can serve any number of concurrent invocations.
#[derive(Clone)]
pub struct IncidentOrchestrator {
    detection: DetectionStageRef,
    strategy: StrategyStageRef,
    governance: GovernanceStageRef,
    execution: ExecutionStageRef,
    clock: Arc<dyn Clock>,
    channel_capacity: usize,
    stage_delay: Duration,
    stats: Arc<OrchestratorStats>,
}

impl IncidentOrchestrator {
    pub fn new(
        detection: DetectionStageRef,
        strategy: StrategyStageRef,
        governance: GovernanceStageRef,
        execution: ExecutionStageRef,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            detection,
            strategy,
            governance,
            execution,
            clock,
            channel_capacity: defaults::TRACE_CHANNEL_CAPACITY,
            stage_delay: Duration::from_millis(defaults::STAGE_DELAY_MS),
            stats: Arc::new(OrchestratorStats::default()),
        }
    }

    /// Build the rule-based pipeline described by `config`.
    ///
    /// The resource store backs both the Detection-time inventory probe and
    /// the Execution-time mutation.
    pub fn from_config(
        config: &SentinelConfig,
        store: Arc<dyn ResourceStore>,
        memory: Arc<dyn MemoryRecall>,
        weather: Arc<dyn WeatherLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let detection = DetectionStage::new(
            Arc::new(KeywordClassifier::new(config.detection.rules.clone())),
            Arc::new(StoreInventoryLookup::new(store.clone())),
            weather,
        );
        let strategy = StrategyStage::new(memory, config.strategy.fallback_plan.clone());
        let governance = GovernanceStage::new(GovernancePolicy::from(&config.governance));
        let execution = ExecutionStage::new(store);

        Self::new(
            Arc::new(detection),
            Arc::new(strategy),
            Arc::new(governance),
            Arc::new(execution),
            clock,
        )
        .with_channel_capacity(config.pipeline.channel_capacity)
        .with_stage_delay(Duration::from_millis(config.pipeline.stage_delay_ms))
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Pause between stages (zero disables pacing).
    pub fn with_stage_delay(mut self, delay: Duration) -> Self {
        self.stage_delay = delay;
        self
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Start a run in the background and return its trace immediately.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// stream cancels the run.
    pub fn run(&self, raw_input: impl Into<String>) -> TraceStream {
        let (mut sink, stream) = trace::channel(self.channel_capacity, self.clock.clone());
        let orchestrator = self.clone();
        let ctx = IncidentContext::new(raw_input);
        tokio::spawn(async move {
            orchestrator.run_with_sink(&ctx, &mut sink).await;
        });
        stream
    }

    /// Drive one run to its end against a caller-supplied sink.
    ///
    /// Returns `None` when the consumer abandoned the stream.
    pub async fn run_with_sink(
        &self,
        ctx: &IncidentContext,
        sink: &mut TraceSink,
    ) -> Option<RunOutcome> {
        let span = info_span!("incident", id = %ctx.id());
        async {
            self.stats.started.fetch_add(1, Ordering::Relaxed);
            let started = Instant::now();

            let outcome = self.drive(ctx, sink).await.ok();
            self.stats.record(outcome);

            match outcome {
                Some(outcome) => info!(
                    outcome = outcome.label(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Incident run finished"
                ),
                None => warn!("Trace consumer went away, run cancelled"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Run to the end and collect the whole trace.
    pub async fn run_to_completion(&self, raw_input: impl Into<String>) -> IncidentReport {
        let ctx = IncidentContext::new(raw_input);
        let (sink, stream) = trace::channel(self.channel_capacity, self.clock.clone());

        let producer = async {
            let mut sink = sink;
            self.run_with_sink(&ctx, &mut sink).await
        };
        let (outcome, events) = tokio::join!(producer, stream.collect_all());

        IncidentReport {
            incident_id: ctx.id(),
            events,
            outcome,
        }
    }

    // ------------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------------

    async fn drive(
        &self,
        ctx: &IncidentContext,
        sink: &mut TraceSink,
    ) -> Result<RunOutcome, TraceClosed> {
        sink.for_stage(StageId::System)
            .log(format!("🔵 Incoming News: \"{}\"", ctx.raw_input()))
            .await?;

        // 1. Detection
        let detection = match invoke(self.detection.as_ref(), ctx, sink).await? {
            Ok(detection) => detection,
            Err(e) => return fail(sink, StageId::Detection, e).await,
        };
        sink.for_stage(StageId::Detection)
            .log(format!("📝 Output: {}", detection))
            .await?;
        let is_alert = detection.is_alert();
        if let Err(e) = ctx.record_detection(detection) {
            return fail(sink, StageId::Detection, e).await;
        }
        if !is_alert {
            return finish(
                sink,
                RunOutcome::CompleteClear,
                "✅ System Status: GREEN (No Action Needed)",
            )
            .await;
        }
        self.pace().await;

        // 2. Strategy
        let plan = match invoke(self.strategy.as_ref(), ctx, sink).await? {
            Ok(plan) => plan,
            Err(e) => return fail(sink, StageId::Strategy, e).await,
        };
        sink.for_stage(StageId::Strategy)
            .log(format!("📋 Draft: {}", plan))
            .await?;
        if let Err(e) = ctx.record_plan(plan) {
            return fail(sink, StageId::Strategy, e).await;
        }
        self.pace().await;

        // 3. Governance
        let decision = match invoke(self.governance.as_ref(), ctx, sink).await? {
            Ok(decision) => decision,
            Err(e) => return fail(sink, StageId::Governance, e).await,
        };
        sink.for_stage(StageId::Governance)
            .log(format!("Decision: {}", decision))
            .await?;
        let approved = decision.is_approved();
        let rationale = decision.rationale.clone();
        if let Err(e) = ctx.record_decision(decision) {
            return fail(sink, StageId::Governance, e).await;
        }
        if !approved {
            return finish(
                sink,
                RunOutcome::Rejected,
                format!("🛑 Plan rejected by governance: {}", rationale),
            )
            .await;
        }
        self.pace().await;

        // 4. Execution; never mutate on behalf of a consumer that has left
        sink.ensure_open()?;
        let result = match invoke(self.execution.as_ref(), ctx, sink).await? {
            Ok(result) => result,
            Err(e) => return fail(sink, StageId::Execution, e).await,
        };
        sink.for_stage(StageId::Execution)
            .log(format!("💾 Execution Log: {}", result))
            .await?;
        if let Err(e) = ctx.record_execution_result(result) {
            return fail(sink, StageId::Execution, e).await;
        }

        finish(sink, RunOutcome::CompleteExecuted, "🎉 MISSION COMPLETE.").await
    }

    async fn pace(&self) {
        if !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }
    }
}

/// Announce and evaluate one stage.
///
/// The outer `Result` is cancellation; the inner one is the stage's own.
async fn invoke<O: Send>(
    stage: &dyn Stage<Output = O>,
    ctx: &IncidentContext,
    sink: &mut TraceSink,
) -> Result<Result<O, StageError>, TraceClosed> {
    let mut tracer: StageTracer<'_> = sink.for_stage(stage.id());
    tracer.log(stage.describe()).await?;
    debug!(stage = %stage.id(), "Stage started");

    match stage.evaluate(ctx, &mut tracer).await {
        Err(StageError::Cancelled(closed)) => Err(closed),
        other => Ok(other),
    }
}

async fn finish(
    sink: &mut TraceSink,
    outcome: RunOutcome,
    message: impl Into<String>,
) -> Result<RunOutcome, TraceClosed> {
    sink.terminate(outcome, message).await?;
    Ok(outcome)
}

async fn fail(
    sink: &mut TraceSink,
    stage: StageId,
    error: impl fmt::Display,
) -> Result<RunOutcome, TraceClosed> {
    warn!(%stage, error = %error, "Stage failed");
    finish(
        sink,
        RunOutcome::Failed,
        format!("❌ {} failed: {}", stage, error),
    )
    .await
}
