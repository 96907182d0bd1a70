use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::storage::BriefStore;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Warning,
    Error,
}

/// Result of one sub-check.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheck {
    fn new(status: HealthStatus, message: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            status,
            message: message.into(),
            checked_at,
        }
    }
}

/// Snapshot returned by the status endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub backend: HealthCheck,
    pub database: HealthCheck,
    pub llm: HealthCheck,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Worst status across all sub-checks.
    pub fn overall(&self) -> HealthStatus {
        [&self.backend, &self.database, &self.llm]
            .iter()
            .map(|c| c.status)
            .max_by_key(|s| match s {
                HealthStatus::Ok => 0,
                HealthStatus::Warning => 1,
                HealthStatus::Error => 2,
            })
            .unwrap_or(HealthStatus::Ok)
    }
}

/// Read-only health probe over the store and LLM configuration.
#[derive(Clone)]
pub struct HealthReporter {
    store: Arc<dyn BriefStore>,
    llm_configured: bool,
}

impl HealthReporter {
    pub fn new(store: Arc<dyn BriefStore>, llm_configured: bool) -> Self {
        Self {
            store,
            llm_configured,
        }
    }

    pub fn check(&self) -> HealthReport {
        let now = Utc::now();

        let backend = HealthCheck::new(HealthStatus::Ok, "Backend is running", now);

        let database = match self.store.stats() {
            Ok(stats) => HealthCheck::new(
                HealthStatus::Ok,
                format!(
                    "{} storage OK. {} briefs stored ({} saved).",
                    stats.backend, stats.brief_count, stats.saved_count
                ),
                now,
            ),
            Err(e) => HealthCheck::new(HealthStatus::Error, format!("Storage error: {}", e), now),
        };

        let llm = if self.llm_configured {
            HealthCheck::new(HealthStatus::Ok, "LLM API configured", now)
        } else {
            HealthCheck::new(
                HealthStatus::Warning,
                format!(
                    "No {} set - LLM features unavailable, using offline mock briefs",
                    crate::llm::API_KEY_ENV
                ),
                now,
            )
        };

        HealthReport {
            backend,
            database,
            llm,
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BriefError, Result};
    use crate::storage::{MemoryStore, StoreStats};
    use crate::types::{Brief, BriefId};

    struct BrokenStore;

    impl BriefStore for BrokenStore {
        fn backend(&self) -> &'static str {
            "broken"
        }
        fn append(&self, _: &Brief) -> Result<()> {
            unreachable!()
        }
        fn get(&self, _: BriefId) -> Result<Option<Brief>> {
            unreachable!()
        }
        fn list_recent(&self, _: usize) -> Result<Vec<Brief>> {
            unreachable!()
        }
        fn list_saved(&self) -> Result<Vec<Brief>> {
            unreachable!()
        }
        fn mark_saved(&self, _: BriefId) -> Result<Brief> {
            unreachable!()
        }
        fn stats(&self) -> Result<StoreStats> {
            Err(BriefError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "data dir gone",
            )))
        }
    }

    #[test]
    fn test_healthy_with_credential() {
        let report = HealthReporter::new(Arc::new(MemoryStore::new()), true).check();
        assert_eq!(report.backend.status, HealthStatus::Ok);
        assert_eq!(report.database.status, HealthStatus::Ok);
        assert!(report.database.message.contains("0 briefs"));
        assert_eq!(report.llm.status, HealthStatus::Ok);
        assert_eq!(report.overall(), HealthStatus::Ok);
        assert_eq!(report.llm.checked_at, report.timestamp);
    }

    #[test]
    fn test_missing_credential_is_warning() {
        let report = HealthReporter::new(Arc::new(MemoryStore::new()), false).check();
        assert_eq!(report.llm.status, HealthStatus::Warning);
        assert_eq!(report.overall(), HealthStatus::Warning);
    }

    #[test]
    fn test_storage_failure_is_error() {
        let report = HealthReporter::new(Arc::new(BrokenStore), true).check();
        assert_eq!(report.database.status, HealthStatus::Error);
        assert!(report.database.message.contains("data dir gone"));
        assert_eq!(report.overall(), HealthStatus::Error);
    }

    #[test]
    fn test_report_serializes_lowercase_status() {
        let report = HealthReporter::new(Arc::new(MemoryStore::new()), false).check();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["llm"]["status"], "warning");
        assert!(value["timestamp"].is_string());
    }
}
