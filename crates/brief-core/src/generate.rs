//! Brief generation pipeline.
//!
//! One call runs `Received → Dispatched{Llm|Mock} → ParsedOutput → Validated
//! → Persisted`, with an explicit failure exit at each stage. Nothing is
//! retried here; callers inspect [`BriefError::kind`] to decide.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{BriefError, Result};
use crate::llm::{strip_code_fence, BriefSynthesizer, ChatCompletionsClient, LlmConfig};
use crate::mock::MockGenerator;
use crate::schema::{check_source_urls, validate_brief, Validation, Violation, ViolationKind};
use crate::storage::BriefStore;
use crate::types::Brief;

/// Tunables for [`BriefGenerator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Upper bound on URLs per request. Unbounded when unset.
    pub max_urls: Option<usize>,
    /// Use the offline generator when no LLM credential is configured.
    /// When false, such requests fail with `LlmNotConfigured`.
    pub mock_fallback: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_urls: None,
            mock_fallback: true,
        }
    }
}

/// Which synthesizer handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Llm,
    Mock,
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Llm => write!(f, "llm"),
            Dispatch::Mock => write!(f, "mock"),
        }
    }
}

/// Coordinates request validation, synthesis, schema validation and storage.
pub struct BriefGenerator {
    store: Arc<dyn BriefStore>,
    synthesizer: Option<Arc<dyn BriefSynthesizer>>,
    mock: MockGenerator,
    config: GeneratorConfig,
}

impl BriefGenerator {
    /// A generator with no LLM attached.
    pub fn new(store: Arc<dyn BriefStore>, config: GeneratorConfig) -> Self {
        Self {
            store,
            synthesizer: None,
            mock: MockGenerator::new(),
            config,
        }
    }

    /// Attach a live synthesizer. Requests go to it instead of the mock.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn BriefSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Build from an [`LlmConfig`]: a completion client is attached only when
    /// the config carries a credential.
    pub fn from_llm_config(
        store: Arc<dyn BriefStore>,
        llm: &LlmConfig,
        config: GeneratorConfig,
    ) -> Result<Self> {
        let generator = Self::new(store, config);
        if !llm.is_configured() {
            return Ok(generator);
        }
        let client = ChatCompletionsClient::new(llm.clone())?;
        Ok(generator.with_synthesizer(Arc::new(client)))
    }

    pub fn store(&self) -> &Arc<dyn BriefStore> {
        &self.store
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn llm_configured(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// The path a request would take, or `None` if it would be refused.
    pub fn dispatch(&self) -> Option<Dispatch> {
        match (&self.synthesizer, self.config.mock_fallback) {
            (Some(_), _) => Some(Dispatch::Llm),
            (None, true) => Some(Dispatch::Mock),
            (None, false) => None,
        }
    }

    /// Generate, validate and persist a brief for `urls`.
    pub async fn generate(&self, urls: &[String]) -> Result<Brief> {
        let started = Instant::now();

        check_source_urls(urls, self.config.max_urls)?;

        let candidate = match (&self.synthesizer, self.dispatch()) {
            (Some(synthesizer), _) => {
                info!(
                    "Generating brief for {} URL(s) via llm (model {})",
                    urls.len(),
                    synthesizer.model()
                );
                let text = synthesizer.synthesize(urls).await.map_err(|e| {
                    warn!("LLM call failed: {}", e);
                    BriefError::from(e)
                })?;
                parse_model_output(&text)?
            }
            (None, Some(Dispatch::Mock)) => {
                info!("Generating brief for {} URL(s) via mock", urls.len());
                serde_json::to_value(self.mock.generate(urls))
                    .map_err(|e| BriefError::MalformedModelOutput(e.to_string()))?
            }
            (None, _) => {
                return Err(BriefError::LlmNotConfigured(format!(
                    "{} is not set and mock fallback is disabled",
                    crate::llm::API_KEY_ENV
                )))
            }
        };
        debug!("Parsed model output");

        let mut brief = match validate_brief(&candidate) {
            Validation::Valid(brief) => brief,
            Validation::Invalid(violations) => {
                warn!(
                    "Generated brief failed validation with {} violation(s)",
                    violations.len()
                );
                for v in &violations {
                    debug!("  {}", v);
                }
                return Err(BriefError::SchemaViolation(violations));
            }
        };

        if brief.saved_at.take().is_some() {
            debug!("Discarded saved_at supplied with generated brief {}", brief.id);
        }

        match self.store.append(&brief) {
            Ok(()) => {}
            Err(BriefError::DuplicateBrief(id)) => {
                return Err(BriefError::SchemaViolation(vec![Violation::new(
                    "id",
                    ViolationKind::DuplicateId,
                    format!("id {} is already used by a stored brief", id),
                )]));
            }
            Err(e) => return Err(e),
        }

        info!(
            "Stored brief {} ({} key points, {} sources) in {}ms",
            brief.id,
            brief.key_points.len(),
            brief.sources.len(),
            started.elapsed().as_millis()
        );
        Ok(brief)
    }
}

/// Parse raw model text as JSON, tolerating a surrounding code fence.
pub fn parse_model_output(text: &str) -> Result<Value> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| BriefError::MalformedModelOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::llm::LlmError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Fresh,
        Text(String),
        RateLimited,
    }

    /// Canned synthesizer standing in for the completion API.
    struct FakeSynthesizer {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeSynthesizer {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl BriefSynthesizer for FakeSynthesizer {
        fn model(&self) -> &str {
            "fake"
        }

        async fn synthesize(&self, urls: &[String]) -> std::result::Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Fresh => Ok(serde_json::to_string(&MockGenerator::new().generate(urls)).unwrap()),
                Reply::Text(text) => Ok(text.clone()),
                Reply::RateLimited => Err(LlmError::RateLimited {
                    retry_after_secs: Some(3),
                    message: "slow down".into(),
                }),
            }
        }
    }

    fn urls() -> Vec<String> {
        vec!["https://a.example/1".to_string(), "https://b.example/2".to_string()]
    }

    fn mock_generator() -> (BriefGenerator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (BriefGenerator::new(store.clone(), GeneratorConfig::default()), store)
    }

    fn llm_generator(reply: Reply) -> (BriefGenerator, Arc<MemoryStore>, Arc<FakeSynthesizer>) {
        let store = Arc::new(MemoryStore::new());
        let fake = FakeSynthesizer::new(reply);
        let generator = BriefGenerator::new(store.clone(), GeneratorConfig::default())
            .with_synthesizer(fake.clone());
        (generator, store, fake)
    }

    #[tokio::test]
    async fn test_mock_path_stores_valid_brief() {
        let (generator, store) = mock_generator();
        assert_eq!(generator.dispatch(), Some(Dispatch::Mock));

        let brief = generator.generate(&urls()).await.unwrap();
        assert_eq!(brief.sources.len(), 2);
        assert_eq!(store.get(brief.id).unwrap(), Some(brief.clone()));
        assert!(validate_brief(&serde_json::to_value(&brief).unwrap()).is_valid());
    }

    #[tokio::test]
    async fn test_empty_list_is_invalid_request_without_mutation() {
        let (generator, store) = mock_generator();
        let err = generator.generate(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(store.stats().unwrap().brief_count, 0);
    }

    #[tokio::test]
    async fn test_any_number_of_absolute_urls_accepted_by_default() {
        let (generator, store) = mock_generator();
        let many: Vec<String> = (0..11).map(|i| format!("https://a{}.example/x", i)).collect();
        let brief = generator.generate(&many).await.unwrap();
        assert_eq!(brief.sources.len(), 11);

        let brief = generator
            .generate(&["ftp://files.example/report.pdf".to_string()])
            .await
            .unwrap();
        assert_eq!(brief.sources[0].url, "ftp://files.example/report.pdf");
        assert_eq!(store.stats().unwrap().brief_count, 2);
    }

    #[tokio::test]
    async fn test_configured_cap_rejects_long_lists() {
        let store = Arc::new(MemoryStore::new());
        let config = GeneratorConfig {
            max_urls: Some(2),
            ..Default::default()
        };
        let generator = BriefGenerator::new(store.clone(), config);
        let err = generator
            .generate(&["https://a.example/1".into(), "https://b.example/2".into(), "https://c.example/3".into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(store.stats().unwrap().brief_count, 0);
    }

    #[tokio::test]
    async fn test_malformed_url_is_invalid_request() {
        let (generator, _fake_store, fake) = llm_generator(Reply::Fresh);
        let err = generator
            .generate(&["https://a.example".to_string(), "definitely not".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.violations().unwrap()[0].path, "urls[1]");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_credential_without_fallback() {
        let store = Arc::new(MemoryStore::new());
        let config = GeneratorConfig {
            mock_fallback: false,
            ..Default::default()
        };
        let generator = BriefGenerator::new(store, config);
        assert_eq!(generator.dispatch(), None);
        let err = generator.generate(&urls()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LlmNotConfigured);
    }

    #[tokio::test]
    async fn test_llm_path_validates_and_stores() {
        let (generator, store, fake) = llm_generator(Reply::Fresh);
        assert_eq!(generator.dispatch(), Some(Dispatch::Llm));
        let brief = generator.generate(&urls()).await.unwrap();
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert!(store.get(brief.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_non_json_output_is_malformed() {
        let (generator, store, _) =
            llm_generator(Reply::Text("Here is your brief: it went well".into()));
        let err = generator.generate(&urls()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedModelOutput);
        assert_eq!(store.stats().unwrap().brief_count, 0);
    }

    #[tokio::test]
    async fn test_fenced_output_is_accepted() {
        let body = serde_json::to_string_pretty(&MockGenerator::new().generate(&urls())).unwrap();
        let (generator, _, _) = llm_generator(Reply::Text(format!("```json\n{}\n```", body)));
        assert!(generator.generate(&urls()).await.is_ok());
    }

    #[tokio::test]
    async fn test_schema_violation_carries_paths() {
        let mut value = serde_json::to_value(MockGenerator::new().generate(&urls())).unwrap();
        value["key_points"][0]["credibility"] = serde_json::json!("extreme");
        let (generator, store, _) = llm_generator(Reply::Text(value.to_string()));

        let err = generator.generate(&urls()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);
        assert_eq!(err.violations().unwrap()[0].path, "key_points[0].credibility");
        assert_eq!(store.stats().unwrap().brief_count, 0);
    }

    #[tokio::test]
    async fn test_rate_limit_is_surfaced() {
        let (generator, _, _) = llm_generator(Reply::RateLimited);
        let err = generator.generate(&urls()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_model_supplied_saved_at_is_discarded() {
        let mut brief = MockGenerator::new().generate(&urls());
        brief.saved_at = Some(Utc::now());
        let (generator, _, _) = llm_generator(Reply::Text(serde_json::to_string(&brief).unwrap()));
        let stored = generator.generate(&urls()).await.unwrap();
        assert!(stored.saved_at.is_none());
    }

    #[tokio::test]
    async fn test_reused_brief_id_is_rejected() {
        let text = serde_json::to_string(&MockGenerator::new().generate(&urls())).unwrap();
        let (generator, store, _) = llm_generator(Reply::Text(text));

        generator.generate(&urls()).await.unwrap();
        let err = generator.generate(&urls()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);
        assert_eq!(err.violations().unwrap()[0].path, "id");
        assert_eq!(store.stats().unwrap().brief_count, 1);
    }

    #[test]
    fn test_from_llm_config_only_attaches_client_with_key() {
        let store: Arc<dyn BriefStore> = Arc::new(MemoryStore::new());
        let without = BriefGenerator::from_llm_config(
            store.clone(),
            &LlmConfig::new(),
            GeneratorConfig::default(),
        )
        .unwrap();
        assert!(!without.llm_configured());

        let with = BriefGenerator::from_llm_config(
            store,
            &LlmConfig::new().with_api_key("k"),
            GeneratorConfig::default(),
        )
        .unwrap();
        assert!(with.llm_configured());
    }
}
