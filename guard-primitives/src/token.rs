//! Capability tokens: immutable, per-request authorization evidence.

use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constraint::ParameterConstraint;
use crate::error::{Error, Result};

/// Immutable record of which tools a single user request may use.
///
/// Produced once per request by a classification strategy, strictly before
/// the first tool invocation, and passed by reference into every enforcement
/// gate call. A token is never edited after construction; re-classification
/// produces a new token. Tokens carry no ownership over tools or the catalog,
/// so they can be shared read-only across concurrent tool calls belonging to
/// the same request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapabilityToken {
    id: Uuid,
    issued_at: SystemTime,
    user_request: String,
    granted_tools: BTreeMap<String, bool>,
    confidence: f32,
    classification_method: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    constraints: BTreeMap<String, Vec<ParameterConstraint>>,
}

impl CapabilityToken {
    /// Starts building a token for the supplied request and strategy tag.
    #[must_use]
    pub fn builder(
        user_request: impl Into<String>,
        classification_method: impl Into<String>,
    ) -> CapabilityTokenBuilder {
        CapabilityTokenBuilder {
            user_request: user_request.into(),
            classification_method: classification_method.into(),
            granted_tools: BTreeMap::new(),
            confidence: 0.0,
            constraints: BTreeMap::new(),
        }
    }

    /// Creates a token granting nothing, with confidence 0.0.
    ///
    /// This is the fail-closed outcome classification strategies fall back to
    /// when their underlying dependency cannot produce a confident answer.
    #[must_use]
    pub fn denied<I, S>(
        user_request: impl Into<String>,
        classification_method: impl Into<String>,
        tool_names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = Self::builder(user_request, classification_method);
        for name in tool_names {
            builder = builder.grant(name, false);
        }
        builder.build()
    }

    /// Returns the unique token identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns when the token was issued.
    #[must_use]
    pub const fn issued_at(&self) -> SystemTime {
        self.issued_at
    }

    /// Returns the verbatim user request the token was issued for.
    #[must_use]
    pub fn user_request(&self) -> &str {
        &self.user_request
    }

    /// Returns the full grant mapping.
    #[must_use]
    pub const fn granted_tools(&self) -> &BTreeMap<String, bool> {
        &self.granted_tools
    }

    /// Returns whether the named tool is granted.
    ///
    /// Absence from the grant mapping is treated as not granted, which covers
    /// tools registered after the token was issued.
    #[must_use]
    pub fn grants(&self, name: &str) -> bool {
        self.granted_tools.get(name).copied().unwrap_or(false)
    }

    /// Returns the classification confidence in [0.0, 1.0].
    #[must_use]
    pub const fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the tag identifying the strategy that produced the token.
    #[must_use]
    pub fn classification_method(&self) -> &str {
        &self.classification_method
    }

    /// Returns the constraints attached to the named tool, if any.
    #[must_use]
    pub fn constraints_for(&self, name: &str) -> &[ParameterConstraint] {
        self.constraints
            .get(name)
            .map_or(&[], Vec::as_slice)
    }
}

/// Builder for [`CapabilityToken`].
#[derive(Debug)]
pub struct CapabilityTokenBuilder {
    user_request: String,
    classification_method: String,
    granted_tools: BTreeMap<String, bool>,
    confidence: f32,
    constraints: BTreeMap<String, Vec<ParameterConstraint>>,
}

impl CapabilityTokenBuilder {
    /// Records a grant decision for the named tool.
    #[must_use]
    pub fn grant(mut self, name: impl Into<String>, granted: bool) -> Self {
        self.granted_tools.insert(name.into(), granted);
        self
    }

    /// Seeds a not-granted entry for every supplied tool name.
    ///
    /// Classification strategies call this with the catalog's full tool list
    /// so the resulting grant mapping covers every registered tool.
    #[must_use]
    pub fn deny_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.granted_tools.entry(name.into()).or_insert(false);
        }
        self
    }

    /// Sets the classification confidence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] when the confidence is outside
    /// [0.0, 1.0] or not finite.
    pub fn confidence(mut self, confidence: f32) -> Result<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(Error::invalid_token(format!(
                "confidence must be within [0.0, 1.0], got {confidence}"
            )));
        }
        self.confidence = confidence;
        Ok(self)
    }

    /// Attaches a parameter constraint to the named tool.
    #[must_use]
    pub fn constrain(mut self, tool: impl Into<String>, constraint: ParameterConstraint) -> Self {
        self.constraints
            .entry(tool.into())
            .or_default()
            .push(constraint);
        self
    }

    /// Finalises the token.
    #[must_use]
    pub fn build(self) -> CapabilityToken {
        CapabilityToken {
            id: Uuid::new_v4(),
            issued_at: SystemTime::now(),
            user_request: self.user_request,
            granted_tools: self.granted_tools,
            confidence: self.confidence,
            classification_method: self.classification_method,
            constraints: self.constraints,
        }
    }
}
