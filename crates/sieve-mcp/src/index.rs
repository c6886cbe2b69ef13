use std::sync::Arc;

use sieve_embeddings::{Embedder, tool_text};

use crate::catalog::{Catalog, ToolDescriptor};
use crate::error::McpError;

/// A ranked catalog entry
#[derive(Debug, Clone)]
pub struct ToolMatch {
    pub descriptor: Arc<ToolDescriptor>,
    /// Cosine similarity against the query
    pub score: f32,
}

struct Entry {
    descriptor: Arc<ToolDescriptor>,
    /// Unit length, or all zeros when the text had no signal
    vector: Vec<f32>,
}

/// Vector index over the catalog, ranked by an injected oracle
///
/// Vectors are computed once at build time. Entries keep catalog order so
/// that equal scores fall back to insertion order.
pub struct RelevanceIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<Entry>,
    dimensions: Option<usize>,
}

impl RelevanceIndex {
    /// Embed every catalogued tool
    ///
    /// Tries one batch first and falls back to embedding tools one at a
    /// time. A tool the oracle cannot embed stays callable but is never
    /// returned by [`RelevanceIndex::query`].
    pub async fn build(catalog: &Catalog, embedder: Arc<dyn Embedder>) -> Self {
        let descriptors: Vec<_> = catalog.iter().cloned().collect();
        let texts: Vec<String> = descriptors
            .iter()
            .map(|d| tool_text(&d.id.replace(catalog.separator(), " "), &d.description, d.input_schema()))
            .collect();

        let vectors = match embedder.embed_batch(&texts).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors.into_iter().map(Ok).collect(),
            outcome => {
                if let Err(e) = outcome {
                    tracing::warn!(oracle = embedder.name(), error = %e, "batch embedding failed, embedding tools one by one");
                }
                let mut vectors = Vec::with_capacity(texts.len());
                for text in &texts {
                    vectors.push(embedder.embed(text).await);
                }
                vectors
            }
        };

        let mut dimensions = None;
        let mut entries = Vec::with_capacity(descriptors.len());

        for (descriptor, vector) in descriptors.into_iter().zip(vectors) {
            let vector = match vector {
                Ok(vector) if !vector.is_empty() => vector,
                Ok(_) => {
                    tracing::warn!(tool = %descriptor.id, "oracle returned an empty vector, tool excluded from ranking");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tool = %descriptor.id, error = %e, "failed to embed tool, excluded from ranking");
                    continue;
                }
            };

            let expected = *dimensions.get_or_insert(vector.len());
            if vector.len() != expected {
                tracing::warn!(
                    tool = %descriptor.id,
                    expected,
                    actual = vector.len(),
                    "oracle returned a vector of unexpected size, tool excluded from ranking"
                );
                continue;
            }

            entries.push(Entry {
                descriptor,
                vector: normalize(vector),
            });
        }

        tracing::info!(oracle = embedder.name(), indexed = entries.len(), catalog = catalog.len(), "relevance index built");

        Self {
            embedder,
            entries,
            dimensions,
        }
    }

    /// Return the `k` tools most similar to `text`, best first
    ///
    /// `k` is clamped to `[1, indexed tools]`. An empty index yields no
    /// matches without calling the oracle.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ToolMatch>, McpError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(text).await?;
        if let Some(expected) = self.dimensions
            && query.len() != expected
        {
            return Err(sieve_embeddings::EmbeddingsError::DimensionMismatch {
                expected,
                actual: query.len(),
            }
            .into());
        }
        let query = normalize(query);

        let mut scored: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry, dot(&query, &entry.vector)))
            .collect();

        // stable, so ties keep catalog order
        scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        Ok(scored
            .into_iter()
            .take(k.clamp(1, self.entries.len()))
            .map(|(entry, score)| ToolMatch {
                descriptor: Arc::clone(&entry.descriptor),
                score,
            })
            .collect())
    }

    /// Number of tools that can be ranked
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
