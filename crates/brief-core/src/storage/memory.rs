use chrono::Utc;
use std::sync::{PoisonError, RwLock};

use crate::error::{BriefError, Result};
use crate::storage::traits::{BriefStore, StoreStats};
use crate::types::{Brief, BriefId};

/// In-process store. Contents live as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    briefs: RwLock<Vec<Brief>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BriefStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn append(&self, brief: &Brief) -> Result<()> {
        let mut briefs = self.briefs.write().unwrap_or_else(PoisonError::into_inner);
        if briefs.iter().any(|b| b.id == brief.id) {
            return Err(BriefError::DuplicateBrief(brief.id));
        }
        briefs.push(brief.clone());
        Ok(())
    }

    fn get(&self, id: BriefId) -> Result<Option<Brief>> {
        let briefs = self.briefs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(briefs.iter().find(|b| b.id == id).cloned())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Brief>> {
        let briefs = self.briefs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(briefs.iter().rev().take(limit).cloned().collect())
    }

    fn list_saved(&self) -> Result<Vec<Brief>> {
        let briefs = self.briefs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(briefs.iter().filter(|b| b.is_saved()).cloned().collect())
    }

    fn mark_saved(&self, id: BriefId) -> Result<Brief> {
        let mut briefs = self.briefs.write().unwrap_or_else(PoisonError::into_inner);
        let brief = briefs
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| BriefError::NotFound(id.to_string()))?;
        brief.mark_saved(Utc::now());
        Ok(brief.clone())
    }

    fn stats(&self) -> Result<StoreStats> {
        let briefs = self.briefs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(StoreStats {
            backend: self.backend(),
            brief_count: briefs.len() as u64,
            saved_count: briefs.iter().filter(|b| b.is_saved()).count() as u64,
        })
    }
}
