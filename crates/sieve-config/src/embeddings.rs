use secrecy::SecretString;
use serde::Deserialize;

/// Scoring oracle used to turn tool descriptions and queries into vectors
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingsConfig {
    /// `OpenAI`-compatible `/embeddings` endpoint
    Openai(OpenAiEmbeddingsConfig),
    /// Local hashed bag-of-words vectors, no network access required
    Lexical(LexicalEmbeddingsConfig),
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self::Lexical(LexicalEmbeddingsConfig::default())
    }
}

impl EmbeddingsConfig {
    /// Identifier of the oracle for logs
    pub fn oracle_id(&self) -> String {
        match self {
            Self::Openai(config) => format!("openai/{}", config.model),
            Self::Lexical(config) => format!("lexical/{}", config.dimensions),
        }
    }
}

/// Configuration for an `OpenAI`-compatible embeddings API
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiEmbeddingsConfig {
    /// Model identifier (e.g. "text-embedding-3-small")
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// API key; optional for self-hosted endpoints
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override (e.g. a local Ollama or vLLM server)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Requested output dimensions for models that support shortening
    #[serde(default)]
    pub dimensions: Option<u32>,
}

/// Configuration for the local lexical embedder
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LexicalEmbeddingsConfig {
    /// Number of hash buckets per vector
    #[serde(default = "default_lexical_dimensions")]
    pub dimensions: usize,
}

impl Default for LexicalEmbeddingsConfig {
    fn default() -> Self {
        Self {
            dimensions: default_lexical_dimensions(),
        }
    }
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_owned()
}

const fn default_lexical_dimensions() -> usize {
    512
}
