//! Remote-language-model classification strategy.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use guard_catalog::ToolCatalog;
use guard_primitives::{CapabilityToken, Result, ToolDefinition};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::IntentClassifier;

const METHOD: &str = "llm";
const METHOD_ERROR: &str = "llm-error";

/// Trait implemented by language-model completion backends.
///
/// The classifier is agnostic to the provider; implementations wrap whatever
/// client the embedding application uses and surface failures as errors so
/// classification can fail closed.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Returns the raw model response text for the supplied prompts.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// JSON object the model is instructed to return.
#[derive(Debug, Deserialize)]
struct GrantResponse {
    granted_tools: BTreeMap<String, bool>,
    #[serde(default)]
    confidence: f32,
}

/// Classifier delegating the grant decision to a language model.
pub struct LlmClassifier {
    catalog: Arc<ToolCatalog>,
    model: Arc<dyn CompletionModel>,
}

impl std::fmt::Debug for LlmClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClassifier").finish_non_exhaustive()
    }
}

impl LlmClassifier {
    /// Creates a classifier over the supplied catalog and model.
    #[must_use]
    pub fn new(catalog: Arc<ToolCatalog>, model: Arc<dyn CompletionModel>) -> Self {
        Self { catalog, model }
    }

    fn system_prompt(definitions: &BTreeMap<String, ToolDefinition>) -> String {
        let mut prompt = String::from(
            "You decide which tools a user request legitimately needs. \
             Respond with a single JSON object of the shape \
             {\"granted_tools\": {\"tool_name\": true|false, ...}, \
             \"confidence\": number between 0 and 1} and nothing else. \
             Include every tool listed below. Grant a tool only when the \
             request itself calls for it.\n\nAvailable tools:\n",
        );
        for definition in definitions.values() {
            let parameters = if definition.parameters().is_empty() {
                "none".to_owned()
            } else {
                definition
                    .parameters()
                    .iter()
                    .map(|p| format!("{} ({})", p.name(), p.kind()))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            prompt.push_str(&format!(
                "- {} (risk {}): {}. Parameters: {parameters}\n",
                definition.name(),
                definition.risk_level(),
                definition.description(),
            ));
        }
        prompt
    }

    fn fail_closed(&self, user_request: &str) -> CapabilityToken {
        CapabilityToken::denied(
            user_request,
            METHOD_ERROR,
            self.catalog.definitions().into_keys(),
        )
    }
}

/// Extracts the outermost JSON object from a model response, tolerating
/// surrounding prose or code fences.
fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end >= start).then(|| &response[start..=end])
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, user_request: &str) -> Result<CapabilityToken> {
        let definitions = self.catalog.definitions();
        if definitions.is_empty() {
            return Ok(CapabilityToken::denied(
                user_request,
                METHOD,
                std::iter::empty::<String>(),
            ));
        }

        let system_prompt = Self::system_prompt(&definitions);
        let response = match self.model.complete(&system_prompt, user_request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "language model call failed, denying all tools");
                return Ok(self.fail_closed(user_request));
            }
        };

        let Some(payload) = extract_json(&response) else {
            warn!("language model response contained no JSON object, denying all tools");
            return Ok(self.fail_closed(user_request));
        };
        let parsed: GrantResponse = match serde_json::from_str(payload) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "language model response failed to parse, denying all tools");
                return Ok(self.fail_closed(user_request));
            }
        };

        let mut builder = CapabilityToken::builder(user_request, METHOD)
            .deny_all(definitions.keys().cloned());
        for (name, granted) in parsed.granted_tools {
            if definitions.contains_key(&name) {
                builder = builder.grant(name, granted);
            } else {
                debug!(tool = %name, "model granted unknown tool, ignoring");
            }
        }

        let confidence = if parsed.confidence.is_finite() {
            parsed.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Ok(builder.confidence(confidence)?.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_catalog::Arguments;
    use guard_primitives::{Error, RiskLevel};
    use serde_json::Value;

    struct CannedModel {
        response: String,
    }

    #[async_trait]
    impl CompletionModel for CannedModel {
        async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl CompletionModel for FailingModel {
        async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
            Err(Error::classification("remote API error"))
        }
    }

    fn catalog() -> Arc<ToolCatalog> {
        let catalog = ToolCatalog::new();
        for (name, description) in [("read_web", "Read website"), ("send_email", "Send email")] {
            let definition = ToolDefinition::builder(name)
                .unwrap()
                .description(description)
                .unwrap()
                .risk_level(RiskLevel::new(2).unwrap())
                .build()
                .unwrap();
            catalog
                .register(definition, |_: Arguments| async { Ok(Value::Null) })
                .unwrap();
        }
        Arc::new(catalog)
    }

    #[tokio::test]
    async fn parses_model_grants() {
        let model = CannedModel {
            response: r#"{"granted_tools": {"read_web": true}, "confidence": 0.9}"#.into(),
        };
        let classifier = LlmClassifier::new(catalog(), Arc::new(model));

        let token = classifier.classify("Read this site").await.unwrap();

        assert!(token.grants("read_web"));
        assert!(!token.grants("send_email"));
        assert_eq!(token.confidence(), 0.9);
        assert_eq!(token.classification_method(), "llm");
    }

    #[tokio::test]
    async fn model_failure_denies_all_tools() {
        let classifier = LlmClassifier::new(catalog(), Arc::new(FailingModel));

        let token = classifier.classify("Read this site").await.unwrap();

        assert!(!token.grants("read_web"));
        assert!(!token.grants("send_email"));
        assert_eq!(token.confidence(), 0.0);
        assert!(token.classification_method().contains("error"));
    }

    #[tokio::test]
    async fn malformed_response_denies_all_tools() {
        let model = CannedModel {
            response: "I think you should use read_web!".into(),
        };
        let classifier = LlmClassifier::new(catalog(), Arc::new(model));

        let token = classifier.classify("Read this site").await.unwrap();

        assert!(token.granted_tools().values().all(|granted| !granted));
        assert!(token.classification_method().contains("error"));
    }

    #[tokio::test]
    async fn fenced_json_is_tolerated() {
        let model = CannedModel {
            response: "```json\n{\"granted_tools\": {\"send_email\": true}, \"confidence\": 0.8}\n```"
                .into(),
        };
        let classifier = LlmClassifier::new(catalog(), Arc::new(model));

        let token = classifier.classify("email alice").await.unwrap();
        assert!(token.grants("send_email"));
    }

    #[tokio::test]
    async fn unknown_tools_in_response_are_ignored() {
        let model = CannedModel {
            response: r#"{"granted_tools": {"read_web": true, "rm_rf": true}, "confidence": 1.0}"#
                .into(),
        };
        let classifier = LlmClassifier::new(catalog(), Arc::new(model));

        let token = classifier.classify("Read this site").await.unwrap();

        assert!(token.grants("read_web"));
        assert!(!token.grants("rm_rf"));
        assert_eq!(token.granted_tools().len(), 2);
    }

    #[tokio::test]
    async fn grant_mapping_covers_every_registered_tool() {
        let model = CannedModel {
            response: r#"{"granted_tools": {}, "confidence": 0.5}"#.into(),
        };
        let classifier = LlmClassifier::new(catalog(), Arc::new(model));

        let token = classifier.classify("anything").await.unwrap();
        assert_eq!(token.granted_tools().len(), 2);
    }
}
