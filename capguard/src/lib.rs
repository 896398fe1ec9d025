//! Capability-based security facade for LLM agents.
//!
//! Depend on this crate via `cargo add capguard`. It bundles the engine
//! crates behind feature flags so downstream users can enable or disable
//! components as needed for their agents: classify the user request into a
//! capability token before any untrusted content is read, then route every
//! tool invocation through the enforcement gate.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use guard_primitives as primitives;

/// Tool catalog and registration helpers (enabled by `catalog` feature).
#[cfg(feature = "catalog")]
pub use guard_catalog as catalog;

/// Classification strategies (enabled by `classify` feature).
#[cfg(feature = "classify")]
pub use guard_classify as classify;

/// Audit trail (enabled by `audit` feature).
#[cfg(feature = "audit")]
pub use guard_audit as audit;

/// Enforcement gate (enabled by `enforce` feature).
#[cfg(feature = "enforce")]
pub use guard_enforce as enforce;
