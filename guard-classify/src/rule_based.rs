//! Keyword-rule classification strategy.

use std::sync::Arc;

use async_trait::async_trait;
use guard_catalog::ToolCatalog;
use guard_primitives::{CapabilityToken, Error, Result};
use tracing::{debug, warn};

use crate::IntentClassifier;

const METHOD: &str = "rule-based";

/// A keyword that grants a set of tools when it appears in the request.
#[derive(Clone, Debug)]
pub struct ClassificationRule {
    keyword: String,
    tools: Vec<String>,
}

impl ClassificationRule {
    /// Creates a rule granting the supplied tools when the keyword matches.
    ///
    /// Matching is case-insensitive; the keyword is stored lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Classification`] when the keyword is empty or the
    /// tool list is empty.
    pub fn new<I, S>(keyword: impl Into<String>, tools: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keyword = keyword.into().to_lowercase();
        if keyword.trim().is_empty() {
            return Err(Error::classification("rule keyword cannot be empty"));
        }

        let tools: Vec<String> = tools.into_iter().map(Into::into).collect();
        if tools.is_empty() {
            return Err(Error::classification(format!(
                "rule `{keyword}` grants no tools"
            )));
        }

        Ok(Self { keyword, tools })
    }

    /// Returns the lowercased keyword.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Returns the tools granted by the rule.
    #[must_use]
    pub fn tools(&self) -> &[String] {
        &self.tools
    }
}

/// Returns a starter rule set for the common demo tool names.
///
/// Intended as a starting point; production deployments supply rules written
/// against their own catalog.
#[must_use]
pub fn default_rules() -> Vec<ClassificationRule> {
    let rules = [
        ("email", vec!["send_email"]),
        ("search", vec!["search_emails"]),
        ("read", vec!["read_website"]),
        ("website", vec!["read_website"]),
        ("url", vec!["read_website"]),
        ("http", vec!["read_website"]),
        ("summarize", vec!["read_website"]),
        ("fetch", vec!["read_website"]),
    ];

    rules
        .into_iter()
        .map(|(keyword, tools)| {
            ClassificationRule::new(keyword, tools).expect("starter rule is well-formed")
        })
        .collect()
}

/// Classifier granting tools through case-insensitive keyword matching.
#[derive(Debug)]
pub struct RuleBasedClassifier {
    catalog: Arc<ToolCatalog>,
    rules: Vec<ClassificationRule>,
}

impl RuleBasedClassifier {
    /// Creates a classifier over the supplied catalog and rules.
    ///
    /// Rules are applied in order; later rules can only add grants.
    #[must_use]
    pub fn new(catalog: Arc<ToolCatalog>, rules: Vec<ClassificationRule>) -> Self {
        Self { catalog, rules }
    }

    /// Returns the configured rules.
    #[must_use]
    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedClassifier {
    async fn classify(&self, user_request: &str) -> Result<CapabilityToken> {
        let definitions = self.catalog.definitions();
        if definitions.is_empty() {
            return Ok(CapabilityToken::denied(
                user_request,
                METHOD,
                std::iter::empty::<String>(),
            ));
        }

        let lowered = user_request.to_lowercase();
        let mut builder = CapabilityToken::builder(user_request, METHOD)
            .deny_all(definitions.keys().cloned());

        for rule in &self.rules {
            if !lowered.contains(rule.keyword()) {
                continue;
            }
            debug!(keyword = rule.keyword(), "classification rule matched");
            for tool in rule.tools() {
                if definitions.contains_key(tool) {
                    builder = builder.grant(tool.clone(), true);
                } else {
                    warn!(tool = %tool, keyword = rule.keyword(), "rule references unregistered tool");
                }
            }
        }

        Ok(builder.confidence(1.0)?.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_catalog::Arguments;
    use guard_primitives::{RiskLevel, ToolDefinition};
    use serde_json::Value;

    fn catalog() -> Arc<ToolCatalog> {
        let catalog = ToolCatalog::new();
        for (name, risk) in [("read_web", 2), ("send_email", 4)] {
            let definition = ToolDefinition::builder(name)
                .unwrap()
                .description(if name == "read_web" {
                    "Read website"
                } else {
                    "Send email"
                })
                .unwrap()
                .risk_level(RiskLevel::new(risk).unwrap())
                .build()
                .unwrap();
            catalog
                .register(definition, |_: Arguments| async { Ok(Value::Null) })
                .unwrap();
        }
        Arc::new(catalog)
    }

    #[tokio::test]
    async fn keyword_grants_listed_tools_only() {
        let rules = vec![ClassificationRule::new("email", ["send_email"]).unwrap()];
        let classifier = RuleBasedClassifier::new(catalog(), rules);

        let token = classifier.classify("Please send an email").await.unwrap();

        assert!(token.grants("send_email"));
        assert!(!token.grants("read_web"));
        assert_eq!(token.granted_tools().len(), 2);
        assert_eq!(token.classification_method(), "rule-based");
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let rules = vec![ClassificationRule::new("EMAIL", ["send_email"]).unwrap()];
        let classifier = RuleBasedClassifier::new(catalog(), rules);

        let token = classifier.classify("Send an Email please").await.unwrap();
        assert!(token.grants("send_email"));
    }

    #[tokio::test]
    async fn unmatched_request_grants_nothing() {
        let rules = vec![ClassificationRule::new("email", ["send_email"]).unwrap()];
        let classifier = RuleBasedClassifier::new(catalog(), rules);

        let token = classifier.classify("What time is it?").await.unwrap();

        assert_eq!(token.granted_tools().len(), 2);
        assert!(token.granted_tools().values().all(|granted| !granted));
    }

    #[tokio::test]
    async fn unregistered_rule_target_is_ignored() {
        let rules = vec![ClassificationRule::new("email", ["delete_files"]).unwrap()];
        let classifier = RuleBasedClassifier::new(catalog(), rules);

        let token = classifier.classify("email me").await.unwrap();

        assert!(!token.grants("delete_files"));
        assert_eq!(token.granted_tools().len(), 2);
    }

    #[tokio::test]
    async fn empty_catalog_fails_closed() {
        let classifier = RuleBasedClassifier::new(Arc::new(ToolCatalog::new()), default_rules());

        let token = classifier.classify("email me").await.unwrap();

        assert!(token.granted_tools().is_empty());
        assert_eq!(token.confidence(), 0.0);
    }

    #[test]
    fn rejects_degenerate_rules() {
        assert!(ClassificationRule::new("", ["tool"]).is_err());
        assert!(ClassificationRule::new("email", Vec::<String>::new()).is_err());
    }
}
