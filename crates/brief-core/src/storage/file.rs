use chrono::Utc;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{BriefError, Result};
use crate::storage::traits::{BriefStore, StoreStats};
use crate::types::{Brief, BriefId};

/// Briefs kept as a single JSON array on disk.
///
/// The whole file is rewritten on every mutation (temp file + rename). The
/// in-memory copy is only updated after the write succeeds, and the mutex
/// makes each read-modify-write cycle a critical section.
pub struct JsonFileStore {
    path: PathBuf,
    briefs: Mutex<Vec<Brief>>,
}

impl JsonFileStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let briefs = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            Vec::new()
        };

        debug!("Loaded {} briefs from {:?}", briefs.len(), path);

        Ok(Self {
            path,
            briefs: Mutex::new(briefs),
        })
    }

    /// Get the backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, briefs: &[Brief]) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(briefs)?;
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl BriefStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn append(&self, brief: &Brief) -> Result<()> {
        let mut briefs = self.briefs.lock().unwrap_or_else(PoisonError::into_inner);
        if briefs.iter().any(|b| b.id == brief.id) {
            return Err(BriefError::DuplicateBrief(brief.id));
        }
        briefs.push(brief.clone());
        if let Err(e) = self.persist(&briefs) {
            briefs.pop();
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, id: BriefId) -> Result<Option<Brief>> {
        let briefs = self.briefs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(briefs.iter().find(|b| b.id == id).cloned())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Brief>> {
        let briefs = self.briefs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(briefs.iter().rev().take(limit).cloned().collect())
    }

    fn list_saved(&self) -> Result<Vec<Brief>> {
        let briefs = self.briefs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(briefs.iter().filter(|b| b.is_saved()).cloned().collect())
    }

    fn mark_saved(&self, id: BriefId) -> Result<Brief> {
        let mut briefs = self.briefs.lock().unwrap_or_else(PoisonError::into_inner);
        let pos = briefs
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BriefError::NotFound(id.to_string()))?;

        if briefs[pos].is_saved() {
            return Ok(briefs[pos].clone());
        }

        let mut updated = briefs.clone();
        updated[pos].mark_saved(Utc::now());
        self.persist(&updated)?;
        *briefs = updated;
        Ok(briefs[pos].clone())
    }

    fn stats(&self) -> Result<StoreStats> {
        let briefs = self.briefs.lock().unwrap_or_else(PoisonError::into_inner);
        // Confirms the backing directory is still reachable.
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::metadata(parent)?;
        }
        Ok(StoreStats {
            backend: self.backend(),
            brief_count: briefs.len() as u64,
            saved_count: briefs.iter().filter(|b| b.is_saved()).count() as u64,
        })
    }
}
