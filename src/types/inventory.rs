//! Resource-store records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status marker of one stock item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "IN STOCK")]
    InStock,
    #[serde(rename = "IN TRANSIT - REROUTED")]
    InTransitRerouted,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "IN STOCK"),
            StockStatus::InTransitRerouted => write!(f, "IN TRANSIT - REROUTED"),
        }
    }
}

/// Warehouse holdings for one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub warehouse_id: String,
    /// Item name → current status
    pub stock: BTreeMap<String, StockStatus>,
    pub capacity_percent: u8,
}

impl RegionRecord {
    /// New record with every item in stock.
    pub fn new<I, S>(warehouse_id: impl Into<String>, items: I, capacity_percent: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            warehouse_id: warehouse_id.into(),
            stock: items
                .into_iter()
                .map(|item| (item.into(), StockStatus::InStock))
                .collect(),
            capacity_percent,
        }
    }

    pub fn stock_items(&self) -> impl Iterator<Item = &str> {
        self.stock.keys().map(String::as_str)
    }

    pub fn status_of(&self, item: &str) -> Option<StockStatus> {
        self.stock.get(item).copied()
    }

    /// One-line summary used by the inventory lookup.
    pub fn summary(&self) -> String {
        let items: Vec<&str> = self.stock_items().collect();
        format!(
            "{} holds [{}] at {}% capacity",
            self.warehouse_id,
            items.join(", "),
            self.capacity_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_marks_items_in_stock() {
        let record = RegionRecord::new("WH-HAM-99", ["Automotive Parts", "Steel"], 40);
        assert_eq!(record.status_of("Steel"), Some(StockStatus::InStock));
        assert_eq!(record.status_of("Lumber"), None);
        assert_eq!(
            record.summary(),
            "WH-HAM-99 holds [Automotive Parts, Steel] at 40% capacity"
        );
    }

    #[test]
    fn test_status_serializes_as_marker() {
        let json = serde_json::to_string(&StockStatus::InTransitRerouted).unwrap();
        assert_eq!(json, "\"IN TRANSIT - REROUTED\"");
    }
}
