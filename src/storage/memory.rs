//! In-memory resource store
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart.

use super::apply_reroute;
use crate::capabilities::{CapabilityError, ResourceStore};
use crate::types::RegionRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

pub struct InMemoryResourceStore {
    regions: RwLock<BTreeMap<String, RegionRecord>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self {
            regions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = (String, RegionRecord)>) -> Self {
        Self {
            regions: RwLock::new(records.into_iter().collect()),
        }
    }

    /// Copy of every record, keyed by region.
    pub fn snapshot(&self) -> Result<BTreeMap<String, RegionRecord>, CapabilityError> {
        let regions = self
            .regions
            .read()
            .map_err(|e| CapabilityError::Storage(e.to_string()))?;
        Ok(regions.clone())
    }
}

impl Default for InMemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get(&self, region: &str) -> Result<Option<RegionRecord>, CapabilityError> {
        let regions = self
            .regions
            .read()
            .map_err(|e| CapabilityError::Storage(e.to_string()))?;
        Ok(regions.get(region).cloned())
    }

    async fn mark_rerouted(
        &self,
        region: &str,
        items: &[String],
    ) -> Result<RegionRecord, CapabilityError> {
        let mut regions = self
            .regions
            .write()
            .map_err(|e| CapabilityError::Storage(e.to_string()))?;

        let record = regions
            .get_mut(region)
            .ok_or_else(|| CapabilityError::UnknownRegion(region.to_string()))?;
        apply_reroute(region, record, items)?;
        Ok(record.clone())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StockStatus;

    fn store() -> InMemoryResourceStore {
        InMemoryResourceStore::from_records([(
            "Hamburg_Port".to_string(),
            RegionRecord::new("WH-HAM-99", ["Automotive Parts", "Steel"], 40),
        )])
    }

    #[tokio::test]
    async fn test_mark_rerouted_updates_only_named_items() {
        let store = store();
        let updated = store
            .mark_rerouted("Hamburg_Port", &["Automotive Parts".to_string()])
            .await
            .unwrap();

        assert_eq!(
            updated.status_of("Automotive Parts"),
            Some(StockStatus::InTransitRerouted)
        );
        assert_eq!(updated.status_of("Steel"), Some(StockStatus::InStock));

        let stored = store.get("Hamburg_Port").await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_unknown_region_fails() {
        let err = store()
            .mark_rerouted("Tokyo", &["Steel".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, CapabilityError::UnknownRegion("Tokyo".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_item_leaves_record_untouched() {
        let store = store();
        let err = store
            .mark_rerouted(
                "Hamburg_Port",
                &["Steel".to_string(), "Lumber".to_string()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::UnknownItem { ref item, .. } if item == "Lumber"));

        let record = store.get("Hamburg_Port").await.unwrap().unwrap();
        assert_eq!(record.status_of("Steel"), Some(StockStatus::InStock));
    }

    #[test]
    fn test_snapshot_and_backend_name() {
        let store = store();
        assert_eq!(store.snapshot().unwrap().len(), 1);
        assert_eq!(store.backend_name(), "InMemory");
    }
}
