//! Immutable audit entries, one per tool invocation attempt.

use std::time::SystemTime;

use guard_primitives::CapabilityToken;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Outcome recorded for an invocation attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// The invocation was permitted and the implementation was invoked.
    Executed,
    /// The invocation was refused before reaching the implementation.
    Blocked,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Executed => "executed",
            Self::Blocked => "blocked",
        })
    }
}

/// Record of a single tool invocation attempt.
///
/// Entries are immutable once appended to a trail. The token used for the
/// attempt is embedded whole (tokens are immutable value objects), which
/// keeps the audit correlation to the originating user request intact even
/// after the request completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: Uuid,
    timestamp: SystemTime,
    tool_name: String,
    action: AuditAction,
    parameters: Map<String, Value>,
    token: CapabilityToken,
    potential_attack: bool,
}

impl AuditEntry {
    /// Creates an entry for a permitted invocation.
    #[must_use]
    pub fn executed(
        tool_name: impl Into<String>,
        parameters: Map<String, Value>,
        token: CapabilityToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: SystemTime::now(),
            tool_name: tool_name.into(),
            action: AuditAction::Executed,
            parameters,
            token,
            potential_attack: false,
        }
    }

    /// Creates an entry for a refused invocation.
    ///
    /// `potential_attack` is true when the attempted tool was never part of
    /// the classified intent (every permission denial), false for scoping
    /// violations on granted tools.
    #[must_use]
    pub fn blocked(
        tool_name: impl Into<String>,
        parameters: Map<String, Value>,
        token: CapabilityToken,
        potential_attack: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: SystemTime::now(),
            tool_name: tool_name.into(),
            action: AuditAction::Blocked,
            parameters,
            token,
            potential_attack,
        }
    }

    /// Returns the unique entry identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns when the attempt was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Returns the name of the attempted tool.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Returns the recorded outcome.
    #[must_use]
    pub const fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the parameters passed with the attempt.
    #[must_use]
    pub const fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Returns the capability token used for the attempt.
    #[must_use]
    pub const fn token(&self) -> &CapabilityToken {
        &self.token
    }

    /// Returns whether the attempt looks induced by ingested content rather
    /// than the literal user request.
    #[must_use]
    pub const fn is_potential_attack(&self) -> bool {
        self.potential_attack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token() -> CapabilityToken {
        CapabilityToken::builder("send a mail", "rule-based")
            .grant("send_email", true)
            .build()
    }

    #[test]
    fn executed_entries_are_not_flagged() {
        let entry = AuditEntry::executed("send_email", Map::new(), token());
        assert_eq!(entry.action(), AuditAction::Executed);
        assert!(!entry.is_potential_attack());
    }

    #[test]
    fn blocked_entries_carry_the_flag() {
        let entry = AuditEntry::blocked("read_web", Map::new(), token(), true);
        assert_eq!(entry.action(), AuditAction::Blocked);
        assert!(entry.is_potential_attack());
    }

    #[test]
    fn serialization_roundtrip() {
        let mut parameters = Map::new();
        parameters.insert("to".into(), json!("alice@example.com"));
        let entry = AuditEntry::executed("send_email", parameters, token());

        let encoded = serde_json::to_string(&entry).unwrap();
        let decoded: AuditEntry = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, entry);
    }
}
