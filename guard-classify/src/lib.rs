//! Intent classification for the CapGuard capability engine.
//!
//! A classifier derives a [`guard_primitives::CapabilityToken`] from the
//! original user request, strictly before any tool executes. The engine
//! depends only on the [`IntentClassifier`] trait; the strategies in this
//! crate are interchangeable implementations of it.
//!
//! Every strategy upholds the same contract: the catalog must be fully
//! populated before classification, the issued token's grant mapping covers
//! every registered tool, and any failure to produce a confident answer
//! fails closed (zero grants, confidence 0.0) rather than default-allow.
//! Classification must never incorporate content returned by a tool call;
//! it sees only the original instruction.

#![warn(missing_docs, clippy::pedantic)]

mod embedding;
mod llm;
mod rule_based;

use async_trait::async_trait;
use guard_primitives::{CapabilityToken, Result};

/// Embedding-similarity strategy and its collaborator trait.
pub use embedding::{EmbeddingClassifier, EmbeddingVector, TextEmbedder};
/// Remote-language-model strategy and its collaborator trait.
pub use llm::{CompletionModel, LlmClassifier};
/// Keyword-rule strategy.
pub use rule_based::{ClassificationRule, RuleBasedClassifier, default_rules};

/// Trait implemented by classification strategies.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Derives a capability token from the verbatim user request.
    ///
    /// # Errors
    ///
    /// Returns [`guard_primitives::Error::Classification`] when the strategy
    /// cannot produce a token at all; callers must not proceed to tool
    /// execution without one.
    async fn classify(&self, user_request: &str) -> Result<CapabilityToken>;
}
