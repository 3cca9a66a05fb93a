//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config loading
// ============================================================================

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "SENTINEL_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sentinel.toml";

// ============================================================================
// Pipeline
// ============================================================================

/// Trace channel capacity per run (events buffered ahead of the consumer).
pub const TRACE_CHANNEL_CAPACITY: usize = 32;

/// Pause inserted at each stage boundary (ms). Zero in production and tests;
/// raise it for live demos so an observer can follow the trace.
pub const STAGE_DELAY_MS: u64 = 0;

// ============================================================================
// Strategy
// ============================================================================

/// Plan used when the memory bank has nothing specific.
pub const GENERIC_MITIGATION_PLAN: &str =
    "Plan: 1. Reroute via Rotterdam. 2. Use air freight for urgent steel. 3. Notify clients of 2-day delay.";

/// Past mitigation remembered for the hurricane scenario.
pub const HURRICANE_MITIGATION_PLAN: &str =
    "Plan: 1. Activate flood barriers at warehouse. 2. Accelerate outgoing shipments. 3. Divert inbound trucks to Georgia.";

// ============================================================================
// Governance
// ============================================================================

/// Plans with more numbered steps than this are rejected as infeasible.
pub const MAX_PLAN_STEPS: usize = 5;

// ============================================================================
// HTTP server
// ============================================================================

pub const SERVER_ADDR: &str = "127.0.0.1:7860";

/// SSE keep-alive interval (seconds).
pub const SSE_KEEPALIVE_SECS: u64 = 15;
