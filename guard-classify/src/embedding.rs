//! Embedding-similarity classification strategy.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use guard_catalog::ToolCatalog;
use guard_primitives::{CapabilityToken, Error, Result, ToolDefinition};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::IntentClassifier;

const METHOD: &str = "embedding";

/// Wrapper type around an immutable floating-point embedding.
#[derive(Clone, PartialEq)]
pub struct EmbeddingVector {
    values: Arc<[f32]>,
}

impl EmbeddingVector {
    /// Creates a new embedding from owned values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Classification`] when the supplied vector is empty or
    /// contains non-finite values.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::classification("embedding vector must not be empty"));
        }
        if !values.iter().all(|value| value.is_finite()) {
            return Err(Error::classification(
                "embedding vector contains non-finite values",
            ));
        }
        Ok(Self {
            values: Arc::<[f32]>::from(values.into_boxed_slice()),
        })
    }

    /// Returns an immutable view of the embedding data.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Returns the dimensionality of the embedding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the embedding is empty. Construction rejects empty
    /// inputs, so this is provided for completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn dot(&self, other: &Self) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    fn magnitude(&self) -> f32 {
        self.values
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt()
    }

    /// Returns the cosine similarity to another embedding.
    ///
    /// Zero-magnitude vectors yield 0.0 rather than dividing by zero.
    #[must_use]
    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        let denominator = self.magnitude() * other.magnitude();
        if denominator == 0.0 {
            return 0.0;
        }
        self.dot(other) / denominator
    }
}

impl std::fmt::Debug for EmbeddingVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingVector")
            .field("dimensions", &self.len())
            .finish()
    }
}

impl Serialize for EmbeddingVector {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.values.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EmbeddingVector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<f32>::deserialize(deserializer)?;
        Self::new(values).map_err(serde::de::Error::custom)
    }
}

/// Trait implemented by sentence-embedding backends.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Encodes the supplied text into an embedding vector.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;
}

/// Classifier granting tools whose description embedding is similar to the
/// request embedding.
///
/// Tool embeddings are computed once at construction from a rich description
/// (the tool description plus its parameter names), so classification itself
/// costs one request embedding and a dot product per tool.
pub struct EmbeddingClassifier {
    catalog: Arc<ToolCatalog>,
    embedder: Arc<dyn TextEmbedder>,
    threshold: f32,
    tool_embeddings: BTreeMap<String, EmbeddingVector>,
}

impl std::fmt::Debug for EmbeddingClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClassifier")
            .field("threshold", &self.threshold)
            .field("tools", &self.tool_embeddings.len())
            .finish_non_exhaustive()
    }
}

fn rich_description(definition: &ToolDefinition) -> String {
    let parameters = if definition.parameters().is_empty() {
        "none".to_owned()
    } else {
        definition
            .parameters()
            .iter()
            .map(guard_primitives::ToolParameter::name)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{}. Parameters: {parameters}", definition.description())
}

impl EmbeddingClassifier {
    /// Creates a classifier, pre-computing one embedding per registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Classification`] when the threshold is outside
    /// [0.0, 1.0] or the embedder fails on a tool description.
    pub async fn new(
        catalog: Arc<ToolCatalog>,
        embedder: Arc<dyn TextEmbedder>,
        threshold: f32,
    ) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(Error::classification(format!(
                "similarity threshold must be within [0.0, 1.0], got {threshold}"
            )));
        }

        let mut tool_embeddings = BTreeMap::new();
        for (name, definition) in catalog.definitions() {
            let embedding = embedder.embed(&rich_description(&definition)).await?;
            tool_embeddings.insert(name, embedding);
        }

        Ok(Self {
            catalog,
            embedder,
            threshold,
            tool_embeddings,
        })
    }

    /// Returns the configured similarity threshold.
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns per-tool similarity scores for the supplied request.
    ///
    /// A debugging and threshold-tuning aid; `classify` is the contract.
    ///
    /// # Errors
    ///
    /// Propagates embedder failures.
    pub async fn similarities(&self, user_request: &str) -> Result<BTreeMap<String, f32>> {
        let request_embedding = self.embedder.embed(user_request).await?;
        Ok(self
            .tool_embeddings
            .iter()
            .map(|(name, embedding)| {
                (name.clone(), request_embedding.cosine_similarity(embedding))
            })
            .collect())
    }
}

#[async_trait]
impl IntentClassifier for EmbeddingClassifier {
    async fn classify(&self, user_request: &str) -> Result<CapabilityToken> {
        if self.tool_embeddings.is_empty() {
            return Ok(CapabilityToken::denied(
                user_request,
                METHOD,
                std::iter::empty::<String>(),
            ));
        }

        let request_embedding = self.embedder.embed(user_request).await?;

        let mut builder = CapabilityToken::builder(user_request, METHOD)
            .deny_all(self.catalog.definitions().into_keys());
        let mut max_similarity: f32 = 0.0;

        for (name, embedding) in &self.tool_embeddings {
            let similarity = request_embedding.cosine_similarity(embedding);
            debug!(tool = %name, similarity, "embedding similarity computed");
            max_similarity = max_similarity.max(similarity);
            if similarity > self.threshold {
                builder = builder.grant(name.clone(), true);
            }
        }

        Ok(builder.confidence(max_similarity.clamp(0.0, 1.0))?.build())
    }
}
