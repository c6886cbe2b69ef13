use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::Embedder;
use crate::error::Result;

/// Words that carry no signal for tool matching
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "if", "in", "into", "is", "it", "its", "of", "on",
    "or", "that", "the", "this", "to", "with", "you", "your",
];

/// Local scoring oracle using hashed bag-of-words vectors
///
/// Each token is hashed into one of `dimensions` buckets with a hash-derived
/// sign, so unrelated tokens that collide tend to cancel rather than add up.
/// Vectors are returned unnormalized; the relevance index normalizes them.
pub struct LexicalEmbedder {
    name: String,
    dimensions: usize,
}

impl LexicalEmbedder {
    /// Create an embedder producing vectors of `dimensions` buckets
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            name: format!("lexical/{dimensions}"),
            dimensions,
        }
    }

    /// Embed without going through the async trait
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let (bucket_bytes, rest) = digest.split_at(8);
            let bucket_bytes: [u8; 8] = bucket_bytes.try_into().unwrap_or_default();
            let bucket = u64::from_le_bytes(bucket_bytes) % self.dimensions as u64;
            let sign = if rest.first().is_some_and(|b| b & 1 == 1) { -1.0 } else { 1.0 };

            if let Some(slot) = usize::try_from(bucket).ok().and_then(|i| vector.get_mut(i)) {
                *slot += sign;
            }
        }

        vector
    }
}

/// Lowercase words with stopwords removed and plural endings folded
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| !STOPWORDS.contains(&word.as_str()))
        .map(|word| fold_plural(&word))
}

fn fold_plural(word: &str) -> String {
    if word.len() > 4
        && let Some(stem) = word.strip_suffix("ies")
    {
        return format!("{stem}y");
    }
    if word.len() > 3 && !word.ends_with("ss") {
        return word.strip_suffix('s').unwrap_or(word).to_owned();
    }
    word.to_owned()
}

#[async_trait]
impl Embedder for LexicalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
