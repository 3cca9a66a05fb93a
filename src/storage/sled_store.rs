//! Sled-backed resource store
//!
//! Key: region identifier (UTF-8 bytes). Value: JSON-serialized `RegionRecord`.
//! Mutations go through a sled transaction so a concurrent reroute of the
//! same region cannot interleave, and the tree is flushed after each write.

use super::apply_reroute;
use crate::capabilities::{CapabilityError, ResourceStore};
use crate::types::RegionRecord;
use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SledResourceStore {
    db: Arc<sled::Db>,
}

impl SledResourceStore {
    /// Open or create the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CapabilityError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(storage_err)?;
        info!("Resource store opened at {:?}", path_ref);
        Ok(Self { db: Arc::new(db) })
    }

    /// Temporary store that is deleted on drop (tests and demos)
    pub fn temporary() -> Result<Self, CapabilityError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage_err)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Insert `records` only if the store holds no regions yet.
    ///
    /// Returns the number of records written.
    pub fn seed_if_empty<'a>(
        &self,
        records: impl IntoIterator<Item = (&'a String, &'a RegionRecord)>,
    ) -> Result<usize, CapabilityError> {
        if !self.db.is_empty() {
            return Ok(0);
        }
        let mut written = 0;
        for (region, record) in records {
            self.put(region, record)?;
            written += 1;
        }
        self.db.flush().map_err(storage_err)?;
        debug!(regions = written, "Seeded resource store");
        Ok(written)
    }

    pub fn put(&self, region: &str, record: &RegionRecord) -> Result<(), CapabilityError> {
        let value =
            serde_json::to_vec(record).map_err(|e| CapabilityError::Storage(e.to_string()))?;
        self.db.insert(region.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    /// Number of stored regions
    pub fn count(&self) -> usize {
        self.db.len()
    }
}

fn storage_err(err: sled::Error) -> CapabilityError {
    CapabilityError::Storage(err.to_string())
}

fn decode(bytes: &[u8]) -> Result<RegionRecord, CapabilityError> {
    serde_json::from_slice(bytes).map_err(|e| CapabilityError::Storage(e.to_string()))
}

#[async_trait]
impl ResourceStore for SledResourceStore {
    async fn get(&self, region: &str) -> Result<Option<RegionRecord>, CapabilityError> {
        match self.db.get(region.as_bytes()).map_err(storage_err)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn mark_rerouted(
        &self,
        region: &str,
        items: &[String],
    ) -> Result<RegionRecord, CapabilityError> {
        let result = self.db.transaction(|tx| {
            let bytes = tx.get(region.as_bytes())?.ok_or_else(|| {
                ConflictableTransactionError::Abort(CapabilityError::UnknownRegion(
                    region.to_string(),
                ))
            })?;
            let mut record = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
            apply_reroute(region, &mut record, items).map_err(ConflictableTransactionError::Abort)?;
            let value = serde_json::to_vec(&record).map_err(|e| {
                ConflictableTransactionError::Abort(CapabilityError::Storage(e.to_string()))
            })?;
            tx.insert(region.as_bytes(), value)?;
            Ok(record)
        });

        let record = match result {
            Ok(record) => record,
            Err(TransactionError::Abort(err)) => return Err(err),
            Err(TransactionError::Storage(err)) => return Err(storage_err(err)),
        };
        self.db.flush_async().await.map_err(storage_err)?;
        Ok(record)
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
