//! Resource store backends
//!
//! Both backends implement [`ResourceStore`](crate::capabilities::ResourceStore)
//! so the Execution stage never sees the storage format:
//! - `InMemoryResourceStore`: `RwLock`-guarded map, for tests and demos
//! - `SledResourceStore`: sled tree keyed by region, JSON-encoded records

mod memory;
mod sled_store;

pub use memory::InMemoryResourceStore;
pub use sled_store::SledResourceStore;

use crate::capabilities::CapabilityError;
use crate::types::{RegionRecord, StockStatus};

/// Apply a reroute to a record, validating every item first so a bad item
/// leaves the record untouched.
fn apply_reroute(
    region: &str,
    record: &mut RegionRecord,
    items: &[String],
) -> Result<(), CapabilityError> {
    if let Some(missing) = items.iter().find(|item| !record.stock.contains_key(*item)) {
        return Err(CapabilityError::UnknownItem {
            region: region.to_string(),
            item: missing.clone(),
        });
    }
    for item in items {
        record
            .stock
            .insert(item.clone(), StockStatus::InTransitRerouted);
    }
    Ok(())
}
