//! Capability collaborators consulted or invoked by stages
//!
//! These are externally owned services. The pipeline only depends on the
//! traits below; every implementation must be thread-safe (Send + Sync)
//! because one instance is shared by all concurrent runs and is responsible
//! for serializing its own mutations.
//!
//! | Trait              | Used by   | Effect                          |
//! |--------------------|-----------|---------------------------------|
//! | `InventoryLookup`  | Detection | advisory text, logged only      |
//! | `WeatherLookup`    | Detection | advisory text, logged only      |
//! | `MemoryRecall`     | Strategy  | past mitigation plan, if any    |
//! | `ResourceStore`    | Execution | marks stock as rerouted         |

mod inventory;
mod memory_bank;
mod weather;

pub use inventory::StoreInventoryLookup;
pub use memory_bank::{InMemoryMemoryBank, MemoryEntry};
pub use weather::StaticWeatherService;

use crate::types::RegionRecord;
use async_trait::async_trait;

/// Failure of a collaborator call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("{capability} unavailable: {reason}")]
    Unavailable {
        capability: &'static str,
        reason: String,
    },
    #[error("no resource record for region `{0}`")]
    UnknownRegion(String),
    #[error("region `{region}` holds no item `{item}`")]
    UnknownItem { region: String, item: String },
    #[error("storage error: {0}")]
    Storage(String),
}

impl CapabilityError {
    pub fn unavailable(capability: &'static str, reason: impl Into<String>) -> Self {
        CapabilityError::Unavailable {
            capability,
            reason: reason.into(),
        }
    }
}

/// Detection-time inventory probe
#[async_trait]
pub trait InventoryLookup: Send + Sync {
    async fn check_inventory(&self, region: &str) -> Result<String, CapabilityError>;
}

/// Detection-time severe-weather probe
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn check_weather(&self, location: &str) -> Result<String, CapabilityError>;
}

/// Recall of past mitigation plans
#[async_trait]
pub trait MemoryRecall: Send + Sync {
    async fn recall(&self, key: &str) -> Result<Option<String>, CapabilityError>;
}

/// Live resource store, keyed by region identifier
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, region: &str) -> Result<Option<RegionRecord>, CapabilityError>;

    /// Transition `items` at `region` to in-transit/rerouted and return the
    /// updated record. Fails without partial effect if the region or any item
    /// is unknown.
    async fn mark_rerouted(
        &self,
        region: &str,
        items: &[String],
    ) -> Result<RegionRecord, CapabilityError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
