pub mod types;
pub mod error;
pub mod schema;
pub mod mock;
pub mod llm;
pub mod storage;
pub mod generate;
pub mod health;

pub use error::{BriefError, ErrorKind, Result};
pub use types::*;
pub use schema::{check_source_urls, validate_brief, GenerateRequest, Validation, Violation, ViolationKind};
pub use mock::MockGenerator;
pub use llm::{BriefPrompt, API_KEY_ENV, BriefSynthesizer, ChatCompletionsClient, LlmConfig, LlmError};
pub use storage::{BriefStore, JsonFileStore, MemoryStore, RedbStore, StoreBackend, StoreStats};
pub use generate::{BriefGenerator, Dispatch, GeneratorConfig};
pub use health::{HealthCheck, HealthReport, HealthReporter, HealthStatus};
