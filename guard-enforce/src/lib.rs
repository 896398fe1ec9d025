//! Enforcement gate for the CapGuard capability engine.
//!
//! Every tool invocation must pass through [`CapabilityEnforcer`], the one
//! layer the agent's reasoning cannot bypass. Classification fixes the
//! permission set before any untrusted content is read; the gate holds the
//! line afterwards and records every attempt in the audit trail.

#![warn(missing_docs, clippy::pedantic)]

mod enforcer;

/// The enforcement gate.
pub use enforcer::CapabilityEnforcer;
