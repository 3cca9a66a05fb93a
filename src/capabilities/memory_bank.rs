//! In-memory bank of past mitigation plans

use super::{CapabilityError, MemoryRecall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// A remembered plan and the term that recalls it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Recalled when this term occurs in the recall key
    pub trigger: String,
    pub plan: String,
}

/// Memory bank shared across runs.
///
/// Reads dominate; `remember` takes the write lock briefly.
pub struct InMemoryMemoryBank {
    entries: RwLock<Vec<MemoryEntry>>,
}

impl InMemoryMemoryBank {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = MemoryEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Store a plan. On recall the earliest matching entry wins.
    pub fn remember(
        &self,
        trigger: impl Into<String>,
        plan: impl Into<String>,
    ) -> Result<(), CapabilityError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CapabilityError::Storage(e.to_string()))?;
        entries.push(MemoryEntry {
            trigger: trigger.into(),
            plan: plan.into(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryRecall for InMemoryMemoryBank {
    async fn recall(&self, key: &str) -> Result<Option<String>, CapabilityError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CapabilityError::unavailable("memory_bank", e.to_string()))?;

        Ok(entries
            .iter()
            .find(|entry| !entry.trigger.is_empty() && key.contains(entry.trigger.as_str()))
            .map(|entry| entry.plan.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hurricane_bank() -> InMemoryMemoryBank {
        InMemoryMemoryBank::from_entries([MemoryEntry {
            trigger: "Florida".to_string(),
            plan: "Plan: 1. Activate flood barriers.".to_string(),
        }])
    }

    #[tokio::test]
    async fn test_recall_matches_trigger_in_key() {
        let bank = hurricane_bank();
        let plan = bank
            .recall("Severe Weather (Storm Gamma) in Florida affecting Electronics.")
            .await
            .unwrap();
        assert_eq!(plan.as_deref(), Some("Plan: 1. Activate flood barriers."));
    }

    #[tokio::test]
    async fn test_recall_without_match_is_none() {
        let bank = hurricane_bank();
        assert!(bank.recall("Labor Strike in Hamburg Port").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remember_adds_entry() {
        let bank = InMemoryMemoryBank::new();
        assert!(bank.is_empty());
        bank.remember("Hamburg", "Plan: 1. Reroute via Rotterdam.").unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(
            bank.recall("strike at Hamburg").await.unwrap().as_deref(),
            Some("Plan: 1. Reroute via Rotterdam.")
        );
    }

    #[tokio::test]
    async fn test_empty_trigger_never_matches() {
        let bank = InMemoryMemoryBank::new();
        bank.remember("", "Plan: everything").unwrap();
        assert!(bank.recall("anything").await.unwrap().is_none());
    }
}
