//! Append-only, in-memory history of invocation attempts.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::entry::{AuditAction, AuditEntry};

/// Ordered, append-only sequence of audit entries.
///
/// The one piece of mutable shared state in the engine: appends are
/// serialized by the internal mutex so entry order reflects real invocation
/// order, and reads observe a consistent prefix. Entries are never mutated,
/// reordered, or deleted during the process lifetime; persistence beyond the
/// process is the embedding application's concern.
#[derive(Default)]
pub struct AuditTrail {
    entries: Mutex<Vec<AuditEntry>>,
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail")
            .field("entries", &self.len())
            .finish()
    }
}

impl AuditTrail {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to the end of the trail.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn append(&self, entry: AuditEntry) {
        match entry.action() {
            AuditAction::Blocked => warn!(
                tool = entry.tool_name(),
                potential_attack = entry.is_potential_attack(),
                request = entry.token().user_request(),
                "blocked tool invocation recorded"
            ),
            AuditAction::Executed => debug!(
                tool = entry.tool_name(),
                "executed tool invocation recorded"
            ),
        }

        let mut entries = self.entries.lock().expect("audit trail poisoned");
        entries.push(entry);
    }

    /// Returns a snapshot of the full ordered entry sequence.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit trail poisoned").clone()
    }

    /// Returns the blocked subsequence, preserving order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn blocked(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .expect("audit trail poisoned")
            .iter()
            .filter(|entry| entry.action() == AuditAction::Blocked)
            .cloned()
            .collect()
    }

    /// Returns the number of recorded entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit trail poisoned").len()
    }

    /// Returns whether the trail is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_primitives::CapabilityToken;
    use serde_json::Map;

    fn token() -> CapabilityToken {
        CapabilityToken::builder("request", "rule-based").build()
    }

    #[test]
    fn appends_preserve_order() {
        let trail = AuditTrail::new();
        trail.append(AuditEntry::executed("a", Map::new(), token()));
        trail.append(AuditEntry::blocked("b", Map::new(), token(), true));
        trail.append(AuditEntry::executed("c", Map::new(), token()));

        let names: Vec<_> = trail
            .entries()
            .iter()
            .map(|entry| entry.tool_name().to_owned())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn blocked_is_an_order_preserving_subsequence() {
        let trail = AuditTrail::new();
        trail.append(AuditEntry::blocked("b1", Map::new(), token(), true));
        trail.append(AuditEntry::executed("e1", Map::new(), token()));
        trail.append(AuditEntry::blocked("b2", Map::new(), token(), false));

        let blocked = trail.blocked();
        assert_eq!(blocked.len(), 2);
        assert_eq!(blocked[0].tool_name(), "b1");
        assert_eq!(blocked[1].tool_name(), "b2");

        let full = trail.entries();
        let mut cursor = full.iter();
        for entry in &blocked {
            assert!(cursor.any(|candidate| candidate.id() == entry.id()));
        }
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        use std::sync::Arc;

        let trail = Arc::new(AuditTrail::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let trail = Arc::clone(&trail);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        trail.append(AuditEntry::executed("tool", Map::new(), token()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(trail.len(), 400);
    }
}
