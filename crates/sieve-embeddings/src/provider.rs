pub mod lexical;
pub mod openai;

use async_trait::async_trait;

use crate::error::Result;

/// Scoring oracle that maps text to a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per input in input order
    ///
    /// Providers that accept batched input should override this. The
    /// default issues one `embed` call per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Oracle identifier for logs
    fn name(&self) -> &str;
}
