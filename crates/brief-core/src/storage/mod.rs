mod file;
mod memory;
mod redb_storage;
mod traits;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use redb_storage::RedbStore;
pub use traits::{BriefStore, StoreStats};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Result;

/// File name of the JSON array used by [`StoreBackend::File`].
pub const FILE_STORE_NAME: &str = "briefs.json";
/// File name of the database used by [`StoreBackend::Redb`].
pub const REDB_STORE_NAME: &str = "briefs.redb";

/// Which [`BriefStore`] implementation to construct.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
    Redb,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::File => "file",
            StoreBackend::Redb => "redb",
        }
    }

    /// Construct the store, placing any files under `data_dir`.
    pub fn open(&self, data_dir: &Path) -> Result<Arc<dyn BriefStore>> {
        Ok(match self {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File => Arc::new(JsonFileStore::open(data_dir.join(FILE_STORE_NAME))?),
            StoreBackend::Redb => Arc::new(RedbStore::open(data_dir.join(REDB_STORE_NAME))?),
        })
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" | "json" => Ok(StoreBackend::File),
            "redb" => Ok(StoreBackend::Redb),
            other => Err(format!(
                "unknown store backend {:?} (expected memory, file or redb)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BriefError, ErrorKind};
    use crate::mock::MockGenerator;
    use crate::types::Brief;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn brief() -> Brief {
        MockGenerator::new().generate(&["https://a.example/1".to_string()])
    }

    /// Run `check` against a fresh instance of every backend.
    fn for_each_backend(check: impl Fn(&dyn BriefStore)) {
        for backend in [StoreBackend::Memory, StoreBackend::File, StoreBackend::Redb] {
            let dir = tempdir().unwrap();
            let store = backend.open(dir.path()).unwrap();
            check(store.as_ref());
        }
    }

    #[test]
    fn test_read_your_writes() {
        for_each_backend(|store| {
            let b = brief();
            store.append(&b).unwrap();
            assert_eq!(store.get(b.id).unwrap(), Some(b.clone()), "{}", store.backend());
            assert_eq!(store.list_recent(1).unwrap(), vec![b]);
        });
    }

    #[test]
    fn test_get_unknown_is_none() {
        for_each_backend(|store| {
            assert!(store.get(Uuid::new_v4()).unwrap().is_none());
        });
    }

    #[test]
    fn test_list_recent_returns_last_n_most_recent_first() {
        for_each_backend(|store| {
            let briefs: Vec<Brief> = (0..7).map(|_| brief()).collect();
            for b in &briefs {
                store.append(b).unwrap();
            }
            let recent: Vec<_> = store.list_recent(5).unwrap().into_iter().map(|b| b.id).collect();
            let expected: Vec<_> = briefs.iter().rev().take(5).map(|b| b.id).collect();
            assert_eq!(recent, expected, "{}", store.backend());
            assert_eq!(store.list_recent(100).unwrap().len(), 7);
            assert!(store.list_recent(0).unwrap().is_empty());
        });
    }

    #[test]
    fn test_list_recent_with_unbounded_limit() {
        for_each_backend(|store| {
            let briefs: Vec<Brief> = (0..3).map(|_| brief()).collect();
            for b in &briefs {
                store.append(b).unwrap();
            }
            let all = store.list_recent(usize::MAX).unwrap();
            assert_eq!(all.len(), 3, "{}", store.backend());
            assert_eq!(all[0].id, briefs[2].id);
        });
    }

    #[test]
    fn test_appending_saved_brief_counts_as_saved() {
        for_each_backend(|store| {
            let mut b = brief();
            b.mark_saved(chrono::Utc::now());
            store.append(&b).unwrap();
            store.append(&brief()).unwrap();

            let stats = store.stats().unwrap();
            assert_eq!((stats.brief_count, stats.saved_count), (2, 1), "{}", store.backend());
            assert_eq!(store.list_saved().unwrap(), vec![b]);
        });
    }

    #[test]
    fn test_mark_saved_is_idempotent() {
        for_each_backend(|store| {
            let b = brief();
            store.append(&b).unwrap();

            let first = store.mark_saved(b.id).unwrap();
            let saved_at = first.saved_at.expect("saved_at set");
            let second = store.mark_saved(b.id).unwrap();
            assert_eq!(second.saved_at, Some(saved_at), "{}", store.backend());
            assert_eq!(store.get(b.id).unwrap().unwrap().saved_at, Some(saved_at));
        });
    }

    #[test]
    fn test_mark_saved_unknown_id_is_not_found() {
        for_each_backend(|store| {
            store.append(&brief()).unwrap();
            let before = store.stats().unwrap();
            let err = store.mark_saved(Uuid::new_v4()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(store.stats().unwrap(), before);
        });
    }

    #[test]
    fn test_list_saved_filters_in_insertion_order() {
        for_each_backend(|store| {
            let briefs: Vec<Brief> = (0..4).map(|_| brief()).collect();
            for b in &briefs {
                store.append(b).unwrap();
            }
            store.mark_saved(briefs[2].id).unwrap();
            store.mark_saved(briefs[0].id).unwrap();

            let saved: Vec<_> = store.list_saved().unwrap().into_iter().map(|b| b.id).collect();
            assert_eq!(saved, vec![briefs[0].id, briefs[2].id], "{}", store.backend());

            let stats = store.stats().unwrap();
            assert_eq!(stats.brief_count, 4);
            assert_eq!(stats.saved_count, 2);
        });
    }

    #[test]
    fn test_duplicate_append_rejected() {
        for_each_backend(|store| {
            let b = brief();
            store.append(&b).unwrap();
            assert!(matches!(store.append(&b), Err(BriefError::DuplicateBrief(id)) if id == b.id));
            assert_eq!(store.stats().unwrap().brief_count, 1);
        });
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let b = brief();
        {
            let store = StoreBackend::File.open(dir.path()).unwrap();
            store.append(&b).unwrap();
            store.mark_saved(b.id).unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join(FILE_STORE_NAME)).unwrap();
        let on_disk: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(on_disk.is_array());
        assert_eq!(on_disk.as_array().unwrap().len(), 1);

        let store = StoreBackend::File.open(dir.path()).unwrap();
        let reloaded = store.get(b.id).unwrap().expect("brief should survive reopen");
        assert!(reloaded.is_saved());
    }

    #[test]
    fn test_redb_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let briefs: Vec<Brief> = (0..3).map(|_| brief()).collect();
        {
            let store = StoreBackend::Redb.open(dir.path()).unwrap();
            for b in &briefs {
                store.append(b).unwrap();
            }
        }

        let store = StoreBackend::Redb.open(dir.path()).unwrap();
        let recent: Vec<_> = store.list_recent(5).unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(recent, vec![briefs[2].id, briefs[1].id, briefs[0].id]);

        // New appends continue the sequence after a reopen.
        let newer = brief();
        store.append(&newer).unwrap();
        assert_eq!(store.list_recent(1).unwrap()[0].id, newer.id);
    }

    #[test]
    fn test_redb_saved_count_survives_reopen() {
        let dir = tempdir().unwrap();
        let briefs: Vec<Brief> = (0..4).map(|_| brief()).collect();
        {
            let store = StoreBackend::Redb.open(dir.path()).unwrap();
            for b in &briefs {
                store.append(b).unwrap();
            }
            store.mark_saved(briefs[3].id).unwrap();
            store.mark_saved(briefs[1].id).unwrap();
            store.mark_saved(briefs[1].id).unwrap();
        }

        let store = StoreBackend::Redb.open(dir.path()).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.brief_count, 4);
        assert_eq!(stats.saved_count, 2);
        let saved: Vec<_> = store.list_saved().unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(saved, vec![briefs[1].id, briefs[3].id]);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        for backend in [StoreBackend::Memory, StoreBackend::File, StoreBackend::Redb] {
            let dir = tempdir().unwrap();
            let store = backend.open(dir.path()).unwrap();

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        for _ in 0..5 {
                            store.append(&brief()).unwrap();
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }

            assert_eq!(store.stats().unwrap().brief_count, 40, "{}", backend);
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("redb".parse::<StoreBackend>().unwrap(), StoreBackend::Redb);
        assert_eq!("JSON".parse::<StoreBackend>().unwrap(), StoreBackend::File);
        assert!("postgres".parse::<StoreBackend>().is_err());
        assert_eq!(StoreBackend::default(), StoreBackend::File);
    }
}
