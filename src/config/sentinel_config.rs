//! Sentinel Configuration - detection vocabulary, plans, policy and seed data
//!
//! Each struct implements `Default` with the reference scenario values, so the
//! system behaves identically with or without a config file.

use super::defaults;
use crate::capabilities::MemoryEntry;
use crate::types::{DetectionStatus, RegionRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `SentinelConfig::load()` which searches:
/// 1. `$SENTINEL_CONFIG` env var
/// 2. `./sentinel.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Threat vocabulary for the keyword classifier
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Static severe-weather advisories
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Resource store seed data
    #[serde(default)]
    pub inventory: InventoryConfig,
}

impl SentinelConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SENTINEL_CONFIG` environment variable
    /// 2. `./sentinel.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(
                            path = %p.display(),
                            rules = config.detection.rules.len(),
                            "Loaded config from SENTINEL_CONFIG"
                        );
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from SENTINEL_CONFIG, falling back"
                        );
                    }
                }
            } else {
                warn!(path = %path, "SENTINEL_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./sentinel.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(
                        rules = config.detection.rules.len(),
                        "Loaded config from ./sentinel.toml"
                    );
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./sentinel.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No sentinel.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check cross-field invariants, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.pipeline.channel_capacity == 0 {
            errors.push("pipeline.channel_capacity must be at least 1".to_string());
        }

        if self.server.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr `{}` is not a valid socket address",
                self.server.addr
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.detection.rules {
            let label = if rule.name.is_empty() { "<unnamed>" } else { rule.name.as_str() };
            if rule.name.is_empty() {
                errors.push("detection.rules: every rule needs a name".to_string());
            } else if !seen.insert(rule.name.as_str()) {
                errors.push(format!("detection.rules: duplicate rule name `{}`", rule.name));
            }
            if rule.keywords.is_empty() || rule.keywords.iter().any(|k| k.trim().is_empty()) {
                errors.push(format!("detection.rules.{}: keywords must be non-empty", label));
            }
            if rule.description.trim().is_empty() {
                errors.push(format!("detection.rules.{}: description is empty", label));
            }
            if rule.status == DetectionStatus::Alert && rule.region.is_none() {
                errors.push(format!(
                    "detection.rules.{}: alert rules must name an affected region",
                    label
                ));
            }
        }

        if self.strategy.fallback_plan.trim().is_empty() {
            errors.push("strategy.fallback_plan is empty".to_string());
        }
        for (i, entry) in self.strategy.memory.iter().enumerate() {
            if entry.trigger.trim().is_empty() || entry.plan.trim().is_empty() {
                errors.push(format!("strategy.memory[{}]: trigger and plan are required", i));
            }
        }

        if self.governance.max_plan_steps == 0 {
            errors.push("governance.max_plan_steps must be at least 1".to_string());
        }

        for (region, seed) in &self.inventory.regions {
            if seed.warehouse_id.trim().is_empty() {
                errors.push(format!("inventory.regions.{}: warehouse_id is empty", region));
            }
            if seed.capacity_percent > 100 {
                errors.push(format!(
                    "inventory.regions.{}: capacity_percent {} exceeds 100",
                    region, seed.capacity_percent
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {1}", path = .0.display())]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({path}): {1}", path = .0.display())]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Trace events buffered ahead of a slow consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Pause at each stage boundary (ms)
    #[serde(default = "default_stage_delay_ms")]
    pub stage_delay_ms: u64,
}

fn default_channel_capacity() -> usize { defaults::TRACE_CHANNEL_CAPACITY }
fn default_stage_delay_ms() -> u64 { defaults::STAGE_DELAY_MS }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            stage_delay_ms: default_stage_delay_ms(),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String { defaults::SERVER_ADDR.to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: default_server_addr() }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// One entry of the threat vocabulary.
///
/// The rule is relevant when any keyword occurs verbatim (case-sensitive) in
/// the headline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatRule {
    pub name: String,
    pub keywords: Vec<String>,
    /// Resource-store region key probed and reported as affected
    #[serde(default)]
    pub region: Option<String>,
    /// Human location label used for the weather probe
    pub location: String,
    #[serde(default = "default_true")]
    pub check_inventory: bool,
    #[serde(default)]
    pub check_weather: bool,
    pub status: DetectionStatus,
    pub description: String,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Evaluated in order; the first matching rule decides the outcome
    #[serde(default = "default_rules")]
    pub rules: Vec<ThreatRule>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { rules: default_rules() }
    }
}

fn default_rules() -> Vec<ThreatRule> {
    vec![
        ThreatRule {
            name: "hamburg-strike".to_string(),
            keywords: vec!["Hamburg".to_string(), "Strike".to_string()],
            region: Some("Hamburg_Port".to_string()),
            location: "Hamburg".to_string(),
            check_inventory: true,
            check_weather: false,
            status: DetectionStatus::Alert,
            description: "Labor Strike in Hamburg Port affecting Automotive Parts.".to_string(),
        },
        ThreatRule {
            name: "florida-hurricane".to_string(),
            keywords: vec!["Florida".to_string(), "Hurricane".to_string()],
            region: Some("US_East_Coast".to_string()),
            location: "Florida".to_string(),
            check_inventory: true,
            check_weather: true,
            status: DetectionStatus::Alert,
            description: "Severe Weather (Storm Gamma) in Florida affecting Electronics."
                .to_string(),
        },
        ThreatRule {
            name: "tokyo-no-stock".to_string(),
            keywords: vec!["Tokyo".to_string()],
            region: Some("Tokyo".to_string()),
            location: "Tokyo".to_string(),
            check_inventory: true,
            check_weather: false,
            status: DetectionStatus::Clear,
            description: "No impact (No active inventory in region).".to_string(),
        },
    ]
}

// ============================================================================
// Strategy
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_fallback_plan")]
    pub fallback_plan: String,

    /// Memory bank seed entries
    #[serde(default = "default_memory")]
    pub memory: Vec<MemoryEntry>,
}

fn default_fallback_plan() -> String { defaults::GENERIC_MITIGATION_PLAN.to_string() }

fn default_memory() -> Vec<MemoryEntry> {
    vec![MemoryEntry {
        trigger: "Florida".to_string(),
        plan: defaults::HURRICANE_MITIGATION_PLAN.to_string(),
    }]
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fallback_plan: default_fallback_plan(),
            memory: default_memory(),
        }
    }
}

// ============================================================================
// Governance
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default = "default_max_plan_steps")]
    pub max_plan_steps: usize,

    /// Plans mentioning any of these terms are rejected
    #[serde(default)]
    pub blocked_terms: Vec<String>,
}

fn default_max_plan_steps() -> usize { defaults::MAX_PLAN_STEPS }

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            max_plan_steps: default_max_plan_steps(),
            blocked_terms: Vec::new(),
        }
    }
}

// ============================================================================
// Weather
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Location → advisory text
    #[serde(default = "default_advisories")]
    pub advisories: HashMap<String, String>,
}

fn default_advisories() -> HashMap<String, String> {
    HashMap::from([(
        "Florida".to_string(),
        "HURRICANE WARNING: Storm Gamma expected to make landfall within 48 hours".to_string(),
    )])
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self { advisories: default_advisories() }
    }
}

// ============================================================================
// Inventory seed
// ============================================================================

/// Seed form of a region record: every listed item starts in stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSeed {
    pub warehouse_id: String,
    pub stock: Vec<String>,
    pub capacity_percent: u8,
}

impl RegionSeed {
    pub fn to_record(&self) -> RegionRecord {
        RegionRecord::new(
            self.warehouse_id.clone(),
            self.stock.iter().cloned(),
            self.capacity_percent,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_regions")]
    pub regions: BTreeMap<String, RegionSeed>,
}

impl InventoryConfig {
    /// Seed records keyed by region.
    pub fn records(&self) -> BTreeMap<String, RegionRecord> {
        self.regions
            .iter()
            .map(|(region, seed)| (region.clone(), seed.to_record()))
            .collect()
    }
}

fn default_regions() -> BTreeMap<String, RegionSeed> {
    let seed = |warehouse: &str, stock: &[&str], capacity: u8| RegionSeed {
        warehouse_id: warehouse.to_string(),
        stock: stock.iter().map(|s| s.to_string()).collect(),
        capacity_percent: capacity,
    };
    BTreeMap::from([
        ("US_East_Coast".to_string(), seed("WH-ATL-01", &["Microchips", "Medical Supplies"], 85)),
        ("Hamburg_Port".to_string(), seed("WH-HAM-99", &["Automotive Parts", "Steel"], 40)),
        ("Shenzhen_Port".to_string(), seed("WH-SZN-22", &["Lithium Batteries", "Screens"], 95)),
    ])
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self { regions: default_regions() }
    }
}
