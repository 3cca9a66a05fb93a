//! Inventory lookup backed by the resource store

use super::{CapabilityError, InventoryLookup, ResourceStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only view of a [`ResourceStore`] used as the Detection-time inventory probe
pub struct StoreInventoryLookup {
    store: Arc<dyn ResourceStore>,
}

impl StoreInventoryLookup {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InventoryLookup for StoreInventoryLookup {
    async fn check_inventory(&self, region: &str) -> Result<String, CapabilityError> {
        match self.store.get(region).await? {
            Some(record) => Ok(record.summary()),
            None => Ok(format!("No active inventory in {}", region)),
        }
    }
}
