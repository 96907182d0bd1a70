use chrono::Utc;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{BriefError, Result};
use crate::storage::traits::{BriefStore, StoreStats};
use crate::types::{Brief, BriefId};

// Briefs keyed by insertion sequence, so iteration order is history order.
const BRIEFS: TableDefinition<u64, &[u8]> = TableDefinition::new("briefs");
// Brief id -> insertion sequence.
const BRIEF_INDEX: TableDefinition<&[u8; 16], u64> = TableDefinition::new("brief_index");
// Insertion sequences of saved briefs. Kept in step with `saved_at` by every write.
const SAVED: TableDefinition<u64, ()> = TableDefinition::new("saved");

/// Redb-based storage implementation
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(&path)?;

        // Make sure every table exists so read transactions can open them.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(BRIEFS)?;
            let _ = write_txn.open_table(BRIEF_INDEX)?;
            let _ = write_txn.open_table(SAVED)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn serialize_brief(brief: &Brief) -> Result<Vec<u8>> {
        serde_json::to_vec(brief).map_err(BriefError::from)
    }

    fn deserialize_brief(bytes: &[u8]) -> Result<Brief> {
        serde_json::from_slice(bytes).map_err(BriefError::from)
    }
}

impl BriefStore for RedbStore {
    fn backend(&self) -> &'static str {
        "redb"
    }

    fn append(&self, brief: &Brief) -> Result<()> {
        let bytes = Self::serialize_brief(brief)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(BRIEF_INDEX)?;
            if index.get(brief.id.as_bytes())?.is_some() {
                return Err(BriefError::DuplicateBrief(brief.id));
            }

            let mut briefs = write_txn.open_table(BRIEFS)?;
            let seq = briefs.last()?.map(|(k, _)| k.value() + 1).unwrap_or(0);
            briefs.insert(seq, bytes.as_slice())?;
            index.insert(brief.id.as_bytes(), seq)?;
            if brief.is_saved() {
                write_txn.open_table(SAVED)?.insert(seq, ())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, id: BriefId) -> Result<Option<Brief>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(BRIEF_INDEX)?;
        let Some(seq) = index.get(id.as_bytes())?.map(|g| g.value()) else {
            return Ok(None);
        };

        let briefs = read_txn.open_table(BRIEFS)?;
        match briefs.get(seq)? {
            Some(bytes) => Ok(Some(Self::deserialize_brief(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Brief>> {
        let read_txn = self.db.begin_read()?;
        let briefs = read_txn.open_table(BRIEFS)?;

        let mut out = Vec::with_capacity(limit.min(briefs.len()? as usize));
        for item in briefs.iter()?.rev().take(limit) {
            let (_, value) = item?;
            out.push(Self::deserialize_brief(value.value())?);
        }
        Ok(out)
    }

    fn list_saved(&self) -> Result<Vec<Brief>> {
        let read_txn = self.db.begin_read()?;
        let briefs = read_txn.open_table(BRIEFS)?;
        let saved = read_txn.open_table(SAVED)?;

        let mut out = Vec::with_capacity(saved.len()? as usize);
        for item in saved.iter()? {
            let (seq, _) = item?;
            if let Some(bytes) = briefs.get(seq.value())? {
                out.push(Self::deserialize_brief(bytes.value())?);
            }
        }
        Ok(out)
    }

    fn mark_saved(&self, id: BriefId) -> Result<Brief> {
        let write_txn = self.db.begin_write()?;
        let brief = {
            let index = write_txn.open_table(BRIEF_INDEX)?;
            let seq = index
                .get(id.as_bytes())?
                .map(|g| g.value())
                .ok_or_else(|| BriefError::NotFound(id.to_string()))?;

            let mut briefs = write_txn.open_table(BRIEFS)?;
            let existing = briefs.get(seq)?.map(|g| g.value().to_vec());
            let mut brief = match existing {
                Some(bytes) => Self::deserialize_brief(&bytes)?,
                None => return Err(BriefError::NotFound(id.to_string())),
            };

            if brief.mark_saved(Utc::now()) {
                let bytes = Self::serialize_brief(&brief)?;
                briefs.insert(seq, bytes.as_slice())?;
                write_txn.open_table(SAVED)?.insert(seq, ())?;
            }
            brief
        };
        write_txn.commit()?;
        Ok(brief)
    }

    fn stats(&self) -> Result<StoreStats> {
        let read_txn = self.db.begin_read()?;
        let briefs = read_txn.open_table(BRIEFS)?;
        let saved = read_txn.open_table(SAVED)?;

        Ok(StoreStats {
            backend: self.backend(),
            brief_count: briefs.len()?,
            saved_count: saved.len()?,
        })
    }
}
