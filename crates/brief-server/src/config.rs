use anyhow::Context;
use brief_core::{BriefGenerator, BriefStore, GeneratorConfig, LlmConfig, StoreBackend};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::Cli;

/// Contents of `brief.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub generate: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl BriefConfig {
    /// Read `path`. A missing file yields the defaults; a file that exists
    /// but does not parse is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Layer command-line flags and their environment variables over the
    /// file values. Only flags that were actually given take effect.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.data_dir {
            self.storage.data_dir = dir.clone();
        }
        if let Some(backend) = cli.store {
            self.storage.backend = backend;
        }
        if let Some(model) = &cli.model {
            self.llm.model = model.clone();
        }
        if let Some(base_url) = &cli.llm_base_url {
            self.llm.base_url = base_url.clone();
        }
        if let Some(mock_fallback) = cli.mock_fallback {
            self.generate.mock_fallback = mock_fallback;
        }
        if let Some(key) = &cli.api_key {
            self.llm = self.llm.clone().with_api_key(key.clone());
        }
    }

    /// Problems that would make the service misbehave. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.generate.max_urls == Some(0) {
            errors.push("generate.max_urls must be at least 1".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            ));
        }
        if self.llm.max_tokens == 0 {
            errors.push("llm.max_tokens must be at least 1".to_string());
        }
        if self.llm.timeout_secs == 0 {
            errors.push("llm.timeout_secs must be at least 1".to_string());
        }
        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://")
        {
            errors.push(format!(
                "llm.base_url must be an http(s) URL, got {:?}",
                self.llm.base_url
            ));
        }
        if self.llm.model.trim().is_empty() {
            errors.push("llm.model must not be empty".to_string());
        }
        errors
    }

    /// Open the configured store, creating the data directory if needed.
    pub fn open_store(&self) -> anyhow::Result<Arc<dyn BriefStore>> {
        if self.storage.backend != StoreBackend::Memory && !self.storage.data_dir.exists() {
            std::fs::create_dir_all(&self.storage.data_dir).with_context(|| {
                format!("failed to create {}", self.storage.data_dir.display())
            })?;
        }
        self.storage
            .backend
            .open(&self.storage.data_dir)
            .with_context(|| format!("failed to open {} store", self.storage.backend))
    }

    /// Build the generation pipeline over `store`.
    pub fn generator(&self, store: Arc<dyn BriefStore>) -> anyhow::Result<BriefGenerator> {
        Ok(BriefGenerator::from_llm_config(
            store,
            &self.llm,
            self.generate.clone(),
        )?)
    }
}
