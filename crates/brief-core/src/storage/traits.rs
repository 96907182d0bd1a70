use serde::Serialize;

use crate::error::Result;
use crate::types::{Brief, BriefId};

/// Storage trait for generated briefs.
///
/// Implementations must give read-your-writes consistency within a process
/// and make every mutation atomic with respect to concurrent callers.
pub trait BriefStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Append a new brief. Fails with `DuplicateBrief` if the id is taken.
    fn append(&self, brief: &Brief) -> Result<()>;

    /// Retrieve a brief by ID
    fn get(&self, id: BriefId) -> Result<Option<Brief>>;

    /// The `limit` most recently appended briefs, most recent first.
    fn list_recent(&self, limit: usize) -> Result<Vec<Brief>>;

    /// All saved briefs, in insertion order.
    fn list_saved(&self) -> Result<Vec<Brief>>;

    /// Mark a brief saved and return it. Idempotent: an already-saved brief
    /// keeps its original `saved_at`. Unknown ids fail with `NotFound`.
    fn mark_saved(&self, id: BriefId) -> Result<Brief>;

    /// Self-check used by the health reporter.
    fn stats(&self) -> Result<StoreStats>;
}

/// Counts reported by [`BriefStore::stats`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub backend: &'static str,
    pub brief_count: u64,
    pub saved_count: u64,
}
