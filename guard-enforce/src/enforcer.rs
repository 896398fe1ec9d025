//! The choke point every tool invocation must pass through.

use std::sync::Arc;

use guard_audit::{AuditEntry, AuditTrail};
use guard_catalog::{Arguments, ToolCatalog};
use guard_primitives::{CapabilityToken, Error, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// Enforcement gate validating invocations against capability tokens.
///
/// The gate is passive and synchronous apart from awaiting the tool
/// implementation: it resolves the tool, checks the token, records the
/// attempt, and invokes. It performs no retries; retry policy belongs to the
/// calling agent loop, and retrying a denial without re-classification
/// cannot change the outcome.
pub struct CapabilityEnforcer {
    catalog: Arc<ToolCatalog>,
    audit: Arc<AuditTrail>,
}

impl std::fmt::Debug for CapabilityEnforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityEnforcer")
            .field("tools", &self.catalog.size())
            .field("audit_entries", &self.audit.len())
            .finish()
    }
}

impl CapabilityEnforcer {
    /// Creates an enforcer over the supplied catalog with a fresh trail.
    #[must_use]
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self::with_audit_trail(catalog, Arc::new(AuditTrail::new()))
    }

    /// Creates an enforcer sharing an existing trail.
    ///
    /// Multiple gates (one per agent, say) appending to one trail keep a
    /// single chronological history across all of them.
    #[must_use]
    pub fn with_audit_trail(catalog: Arc<ToolCatalog>, audit: Arc<AuditTrail>) -> Self {
        Self { catalog, audit }
    }

    /// Returns the catalog the gate resolves tools against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Returns the trail the gate records attempts into.
    #[must_use]
    pub fn audit_trail(&self) -> &Arc<AuditTrail> {
        &self.audit
    }

    /// Executes a named tool if the token permits it.
    ///
    /// Outcomes are terminal: unknown tool, denied, constraint-violated, or
    /// executed. Implementation errors propagate to the caller unchanged;
    /// the attempt is recorded as executed either way, since the gate
    /// permitted it.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] when the tool is not in the catalog. No
    ///   audit entry is appended: the tool never legitimately existed, so
    ///   this is a caller bug rather than a security event.
    /// - [`Error::PermissionDenied`] when the token does not grant the tool.
    ///   Recorded as blocked with `potential_attack = true`.
    /// - [`Error::ConstraintViolation`] when a granted tool is invoked with
    ///   parameters outside the token's constraints. Recorded as blocked
    ///   with `potential_attack = false`.
    /// - Any error the implementation itself returns.
    pub async fn execute_tool(
        &self,
        name: &str,
        token: &CapabilityToken,
        parameters: Arguments,
    ) -> Result<Value> {
        let Some(handle) = self.catalog.get(name) else {
            return Err(Error::ToolNotFound {
                name: name.to_owned(),
            });
        };

        if !token.grants(name) {
            warn!(
                tool = name,
                request = token.user_request(),
                method = token.classification_method(),
                "tool invocation outside the granted capability set"
            );
            self.audit
                .append(AuditEntry::blocked(name, parameters, token.clone(), true));
            return Err(Error::PermissionDenied {
                name: name.to_owned(),
                user_request: token.user_request().to_owned(),
            });
        }

        for constraint in token.constraints_for(name) {
            if let Err(reason) = constraint.check(&parameters) {
                self.audit
                    .append(AuditEntry::blocked(name, parameters, token.clone(), false));
                return Err(Error::ConstraintViolation {
                    name: name.to_owned(),
                    reason,
                });
            }
        }

        self.audit.append(AuditEntry::executed(
            name,
            parameters.clone(),
            token.clone(),
        ));
        debug!(tool = name, "invoking tool implementation");
        handle.invoke(parameters).await
    }

    /// Returns a snapshot of the full ordered audit history.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }

    /// Returns the blocked attempts, preserving order.
    ///
    /// The subsequence an operator reviews for security reporting.
    #[must_use]
    pub fn blocked_attempts(&self) -> Vec<AuditEntry> {
        self.audit.blocked()
    }
}
