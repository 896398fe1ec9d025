//! Shared error taxonomy for the capability engine.

use thiserror::Error;

/// Result alias used throughout the capability engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors emitted by the capability engine.
///
/// Every failure mode across the catalog, classifiers, and enforcement gate
/// is a variant of this single enum so callers can catch uniformly.
#[derive(Debug, Error)]
pub enum Error {
    /// Tool definition failed validation.
    #[error("invalid tool definition: {reason}")]
    InvalidDefinition {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Capability token failed validation.
    #[error("invalid capability token: {reason}")]
    InvalidToken {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Referenced tool is absent from the catalog.
    #[error("tool `{name}` is not registered")]
    ToolNotFound {
        /// Name of the missing tool.
        name: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    ToolAlreadyRegistered {
        /// Name of the offending tool.
        name: String,
    },

    /// A classification strategy failed to produce a token at all.
    ///
    /// Callers must not proceed to tool execution without a valid token.
    #[error("classification failed: {reason}")]
    Classification {
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The attempted tool was not granted by the capability token.
    ///
    /// Always recorded in the audit trail before surfacing. Retrying without
    /// re-classification cannot change the outcome.
    #[error("tool `{name}` is not permitted for request `{user_request}`")]
    PermissionDenied {
        /// Name of the denied tool.
        name: String,
        /// The user request the denying token was issued for.
        user_request: String,
    },

    /// Granted tool invoked with parameters outside the token's constraints.
    #[error("constraint violation on tool `{name}`: {reason}")]
    ConstraintViolation {
        /// Name of the constrained tool.
        name: String,
        /// Which constraint was violated and how.
        reason: String,
    },

    /// Tool implementation reported a failure.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

impl Error {
    /// Creates an invalid-definition error from the supplied reason.
    #[must_use]
    pub fn invalid_definition(reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-token error from the supplied reason.
    #[must_use]
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Creates a classification error from the supplied reason.
    #[must_use]
    pub fn classification(reason: impl Into<String>) -> Self {
        Self::Classification {
            reason: reason.into(),
        }
    }

    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}
