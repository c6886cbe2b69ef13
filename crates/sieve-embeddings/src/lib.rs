//! Scoring oracle for Sieve
//!
//! Turns text into fixed-length vectors so tools can be ranked against a
//! free-text query. The oracle is deterministic for identical input within
//! a process.

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod provider;
mod text;

use std::sync::Arc;

use sieve_config::EmbeddingsConfig;

pub use error::{EmbeddingsError, Result};
pub use provider::Embedder;
pub use provider::lexical::LexicalEmbedder;
pub use provider::openai::OpenAiEmbedder;
pub use text::tool_text;

/// Build the configured scoring oracle
pub fn build_embedder(config: &EmbeddingsConfig) -> Arc<dyn Embedder> {
    let embedder: Arc<dyn Embedder> = match config {
        EmbeddingsConfig::Openai(openai) => Arc::new(OpenAiEmbedder::new(
            openai.model.clone(),
            openai.api_key.clone(),
            openai.base_url.clone(),
            openai.dimensions,
        )),
        EmbeddingsConfig::Lexical(lexical) => Arc::new(LexicalEmbedder::new(lexical.dimensions)),
    };

    tracing::debug!(oracle = embedder.name(), "embeddings oracle initialized");

    embedder
}
