//! Trace Sink - ordered, incrementally delivered event stream for one run
//!
//! A run's trace is a bounded `tokio::sync::mpsc` channel:
//!
//! ```text
//! Orchestrator / Stages ──append──▶ TraceSink ═══ mpsc ═══▶ TraceStream ──▶ consumer
//! ```
//!
//! - `append` returns once the event sits in the channel, so the consumer can
//!   observe it before the producing stage continues. There is no batching.
//! - The channel is bounded; a slow consumer back-pressures the run.
//! - Dropping the `TraceStream` closes the channel. The next `append` fails
//!   with [`TraceClosed`], which the orchestrator treats as cancellation.
//! - The stream ends after the Terminal event and cannot be restarted.

mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use crate::types::{RunOutcome, StageId, TraceEvent, TraceKind};
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// The consumer dropped its end of the trace stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("trace consumer disconnected")]
pub struct TraceClosed;

/// Create a connected sink/stream pair for one invocation.
///
/// A capacity of zero is bumped to one (tokio rejects zero-capacity channels).
pub fn channel(capacity: usize, clock: Arc<dyn Clock>) -> (TraceSink, TraceStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        TraceSink {
            tx,
            clock,
            last_timestamp: None,
        },
        TraceStream { rx, finished: false },
    )
}

// ============================================================================
// Producer side
// ============================================================================

/// Append-only producer end of a run's trace
pub struct TraceSink {
    tx: mpsc::Sender<TraceEvent>,
    clock: Arc<dyn Clock>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl TraceSink {
    /// Timestamp and deliver one event.
    ///
    /// Timestamps never go backwards within a sink even if the clock does.
    pub async fn append(
        &mut self,
        stage: StageId,
        kind: TraceKind,
        message: impl Into<String>,
    ) -> Result<(), TraceClosed> {
        let now = self.clock.now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        let event = TraceEvent {
            timestamp,
            stage,
            kind,
            message: message.into(),
        };
        self.tx.send(event).await.map_err(|_| TraceClosed)
    }

    /// Emit the run's single Terminal event.
    pub async fn terminate(
        &mut self,
        outcome: RunOutcome,
        message: impl Into<String>,
    ) -> Result<(), TraceClosed> {
        self.append(StageId::System, TraceKind::Terminal { outcome }, message)
            .await
    }

    /// Fails if the consumer has already gone away.
    pub fn ensure_open(&self) -> Result<(), TraceClosed> {
        if self.tx.is_closed() {
            Err(TraceClosed)
        } else {
            Ok(())
        }
    }

    /// Scope this sink to a single stage.
    pub fn for_stage(&mut self, stage: StageId) -> StageTracer<'_> {
        StageTracer { sink: self, stage }
    }
}

/// A sink borrowed by one stage; every event is attributed to that stage
pub struct StageTracer<'a> {
    sink: &'a mut TraceSink,
    stage: StageId,
}

impl StageTracer<'_> {
    pub fn stage(&self) -> StageId {
        self.stage
    }

    pub async fn log(&mut self, message: impl Into<String>) -> Result<(), TraceClosed> {
        self.sink.append(self.stage, TraceKind::Log, message).await
    }

    /// Log event of a warning nature (absorbed capability failures).
    pub async fn warn(&mut self, message: impl Into<String>) -> Result<(), TraceClosed> {
        let message = format!("⚠️ {}", message.into());
        self.sink.append(self.stage, TraceKind::Log, message).await
    }

    pub async fn tool_call(&mut self, message: impl Into<String>) -> Result<(), TraceClosed> {
        self.sink.append(self.stage, TraceKind::ToolCall, message).await
    }

    pub async fn memory_recall(&mut self, message: impl Into<String>) -> Result<(), TraceClosed> {
        self.sink
            .append(self.stage, TraceKind::MemoryRecall, message)
            .await
    }
}

// ============================================================================
// Consumer side
// ============================================================================

/// Single-pass consumer end of a run's trace.
///
/// Yields events in emission order and ends after the Terminal event, or
/// when the producer stops without one (the run was abandoned or aborted).
pub struct TraceStream {
    rx: mpsc::Receiver<TraceEvent>,
    finished: bool,
}

impl TraceStream {
    /// Await the next event.
    pub async fn next_event(&mut self) -> Option<TraceEvent> {
        if self.finished {
            return None;
        }
        let event = self.rx.recv().await;
        self.observe(event.as_ref());
        event
    }

    /// Drain the stream to its end.
    pub async fn collect_all(mut self) -> Vec<TraceEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    fn observe(&mut self, event: Option<&TraceEvent>) {
        match event {
            Some(ev) if ev.kind.is_terminal() => {
                self.finished = true;
                self.rx.close();
            }
            Some(_) => {}
            None => self.finished = true,
        }
    }
}

impl Stream for TraceStream {
    type Item = TraceEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(event) => {
                self.observe(event.as_ref());
                Poll::Ready(event)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
