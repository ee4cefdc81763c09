//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `draftrag.toml` +
//! `draftrag.<env>.toml` + `APP_*` env vars (`__` separates nested keys).
//! `expand_path` expands `~` and `${VAR}` in user-supplied paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::traits::MAX_EMBED_BATCH;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("draftrag.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("draftrag.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("draftrag.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("draftrag.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(self.figment.extract_inner(key)?)
    }

    /// Typed engine settings, validated.
    pub fn engine(&self) -> Result<EngineConfig> {
        let config: EngineConfig = self.figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retrieval: RetrievalConfig,
    pub fusion: FusionConfig,
    pub lexical: LexicalConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub max_k: usize,
    pub max_query_chars: usize,
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_k: 5, max_k: 100, max_query_chars: 4096, snippet_chars: 280 }
    }
}

/// Weights applied to the min-max normalized score of each retriever.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub dense_weight: f64,
    pub lexical_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { dense_weight: 0.65, lexical_weight: 0.35 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    pub min_token_chars: usize,
    pub stop_words: bool,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self { min_token_chars: 2, stop_words: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Http,
    Hash,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub dimension: usize,
    pub timeout_ms: u64,
    pub batch_size: usize,
    /// Entries kept in the query embedding cache; 0 disables it.
    pub cache_capacity: usize,
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Http,
            dimension: 1536,
            timeout_ms: 3000,
            batch_size: MAX_EMBED_BATCH,
            cache_capacity: 1024,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Location of the JSONL chunk snapshot read by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub chunk_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { chunk_dir: "./data/chunks".to_string() }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let fusion = &self.fusion;
        for (name, weight) in [("dense_weight", fusion.dense_weight), ("lexical_weight", fusion.lexical_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidConfig(format!("fusion.{name} must be a finite, non-negative number")));
            }
        }
        if fusion.dense_weight == 0.0 && fusion.lexical_weight == 0.0 {
            return Err(Error::InvalidConfig("fusion weights must not both be zero".to_string()));
        }

        let retrieval = &self.retrieval;
        if retrieval.max_k == 0 || retrieval.default_k == 0 || retrieval.default_k > retrieval.max_k {
            return Err(Error::InvalidConfig(format!(
                "retrieval.default_k must be within 1..={}",
                retrieval.max_k
            )));
        }
        if retrieval.max_query_chars == 0 {
            return Err(Error::InvalidConfig("retrieval.max_query_chars must be positive".to_string()));
        }

        let embedding = &self.embedding;
        if embedding.batch_size == 0 || embedding.batch_size > MAX_EMBED_BATCH {
            return Err(Error::InvalidConfig(format!(
                "embedding.batch_size must be within 1..={MAX_EMBED_BATCH}"
            )));
        }
        if embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be positive".to_string()));
        }
        if self.lexical.min_token_chars == 0 {
            return Err(Error::InvalidConfig("lexical.min_token_chars must be positive".to_string()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
