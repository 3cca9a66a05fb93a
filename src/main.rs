//! Supply Chain Sentinel
//!
//! Turns breaking-news headlines into supply-chain incident runs:
//! detection, mitigation planning, governance review and execution
//! against the resource store.
//!
//! # Usage
//!
//! ```bash
//! # One incident, trace printed as it is produced
//! sentinel run "BREAKING: Major labor strike declared at Hamburg Port."
//!
//! # Same, one JSON object per trace event
//! sentinel run --json "URGENT: Hurricane Warning issued for Florida Coast."
//!
//! # HTTP server (incidents streamed as Server-Sent Events)
//! sentinel serve --addr 0.0.0.0:7860
//!
//! # Durable resource store
//! sentinel --sled ./data/inventory serve
//!
//! # Print the effective configuration
//! sentinel config
//! ```
//!
//! # Environment Variables
//!
//! - `SENTINEL_CONFIG`: Path to a TOML config file (default: ./sentinel.toml)
//! - `SENTINEL_CORS_ORIGINS`: Comma-separated origins allowed by the API
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sentinel::agents::IncidentOrchestrator;
use sentinel::api::{create_app, ApiState};
use sentinel::capabilities::{InMemoryMemoryBank, ResourceStore, StaticWeatherService};
use sentinel::config::SentinelConfig;
use sentinel::storage::{InMemoryResourceStore, SledResourceStore};
use sentinel::trace::SystemClock;
use sentinel::types::RunOutcome;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(about = "Supply Chain Sentinel - autonomous supply-chain incident response")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides SENTINEL_CONFIG and ./sentinel.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Persist the resource store in a sled database at this path
    /// (seeded from the config on first use). In-memory when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    sled: Option<PathBuf>,

    /// Emit process logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run one incident and print its trace
    Run {
        /// Breaking-news headline
        headline: String,
        /// Print one JSON object per trace event instead of rendered lines
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Override the server address (default from config: "127.0.0.1:7860")
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

// ============================================================================
// Setup
// ============================================================================

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so `run` output stays clean on stdout
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SentinelConfig> {
    match path {
        Some(p) => SentinelConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(SentinelConfig::load()),
    }
}

fn open_store(
    config: &SentinelConfig,
    sled_path: Option<&PathBuf>,
) -> Result<Arc<dyn ResourceStore>> {
    let seed = config.inventory.records();
    match sled_path {
        Some(path) => {
            let store = SledResourceStore::open(path)
                .with_context(|| format!("Failed to open sled store at {}", path.display()))?;
            let seeded = store
                .seed_if_empty(seed.iter())
                .context("Failed to seed sled store")?;
            info!(path = %path.display(), seeded, regions = store.count(), "Resource store: sled");
            Ok(Arc::new(store))
        }
        None => {
            info!(regions = seed.len(), "Resource store: in-memory");
            Ok(Arc::new(InMemoryResourceStore::from_records(seed)))
        }
    }
}

fn build_orchestrator(
    config: &SentinelConfig,
    store: Arc<dyn ResourceStore>,
) -> IncidentOrchestrator {
    IncidentOrchestrator::from_config(
        config,
        store,
        Arc::new(InMemoryMemoryBank::from_entries(config.strategy.memory.clone())),
        Arc::new(StaticWeatherService::new(config.weather.advisories.clone())),
        Arc::new(SystemClock),
    )
}

// ============================================================================
// Commands
// ============================================================================

/// Print the trace as it arrives. Ctrl+C drops the stream, which cancels
/// the run before any further stage executes.
async fn run_incident(
    orchestrator: IncidentOrchestrator,
    headline: String,
    json: bool,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut stream = orchestrator.run(headline);
    let mut outcome = None;

    loop {
        let event = tokio::select! {
            _ = cancel_token.cancelled() => {
                warn!("Run abandoned before completion");
                break;
            }
            event = stream.next_event() => event,
        };
        let Some(event) = event else { break };

        if json {
            println!("{}", serde_json::to_string(&event).context("Failed to encode trace event")?);
        } else {
            println!("{}", event.render_line());
        }
        if let Some(o) = event.kind.outcome() {
            outcome = Some(o);
        }
    }

    match outcome {
        Some(RunOutcome::Failed) => Err(anyhow::anyhow!("incident run failed")),
        _ => Ok(()),
    }
}

async fn serve(
    config: &SentinelConfig,
    orchestrator: IncidentOrchestrator,
    store: Arc<dyn ResourceStore>,
    addr: Option<String>,
    cancel_token: CancellationToken,
) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let app = create_app(ApiState::new(orchestrator, store));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🌐 API listening on http://{}", addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await;

    match result {
        Ok(()) => {
            info!("[HttpServer] Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("[HttpServer] Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let config = load_config(args.config.as_ref())?;

    if let SubCommand::Config = args.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!(
        rules = config.detection.rules.len(),
        memory = config.strategy.memory.len(),
        regions = config.inventory.regions.len(),
        "Supply Chain Sentinel starting"
    );

    let store = open_store(&config, args.sled.as_ref())?;
    let orchestrator = build_orchestrator(&config, store.clone());

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    match args.command {
        SubCommand::Run { headline, json } => {
            run_incident(orchestrator, headline, json, cancel_token).await
        }
        SubCommand::Serve { addr } => serve(&config, orchestrator, store, addr, cancel_token).await,
        SubCommand::Config => Ok(()),
    }
}
