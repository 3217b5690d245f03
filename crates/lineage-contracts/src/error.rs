//! Error types for the Lineage accountability core.
//!
//! All fallible operations return `LineageResult<T>`. Each variant names the
//! precondition that failed and carries the identifiers involved so callers
//! can report precisely what was rejected.

use std::fmt;

use thiserror::Error;

/// The kind of entity a `NotFound` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Agent,
    Delegation,
    AuditRecord,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Agent => "agent",
            EntityKind::Delegation => "delegation",
            EntityKind::AuditRecord => "audit record",
        };
        f.write_str(s)
    }
}

/// The unified error type for the Lineage crates.
#[derive(Debug, Error)]
pub enum LineageError {
    /// A referenced agent, delegation, or audit record does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityKind, id: String },

    /// A scope was empty or contained a malformed permission string.
    #[error("invalid scope: {reason}")]
    InvalidScope { reason: String },

    /// A spawn requested permissions its parent does not hold.
    #[error("scope attenuation violation: {rejected:?} not in parent scope")]
    ScopeAttenuationViolation { rejected: Vec<String> },

    /// The child already has a parent edge.
    #[error("agent '{child_id}' already has a parent delegation")]
    DuplicateChild { child_id: String },

    /// Recording or walking an edge would close a cycle.
    ///
    /// Integrity fault: the forest invariant was violated upstream.
    #[error("delegation cycle detected at agent '{agent_id}'")]
    CycleDetected { agent_id: String },

    /// A chain walk did not reach a root within the configured bound.
    ///
    /// Integrity fault: the chain is broken or corrupted.
    #[error("delegation chain for agent '{agent_id}' does not resolve to a root within {max_depth} hops")]
    DepthExceeded { agent_id: String, max_depth: u32 },

    /// The lifecycle state machine does not permit this transition.
    #[error("agent '{agent_id}' cannot transition from {from} to {to}")]
    InvalidTransition {
        agent_id: String,
        from: String,
        to: String,
    },

    /// The attribution of a registration is malformed.
    #[error("invalid authority source: {reason}")]
    InvalidAuthoritySource { reason: String },

    /// The operation requires an active agent.
    #[error("agent '{agent_id}' is not active (state: {state})")]
    AgentNotActive { agent_id: String, state: String },

    /// A spawn would exceed the configured maximum delegation depth.
    #[error("spawning from agent '{parent_id}' would exceed the maximum delegation depth of {max_depth}")]
    DelegationLimit { parent_id: String, max_depth: u32 },

    /// Restored state breaks one of the store invariants.
    #[error("integrity violation: {reason}")]
    IntegrityViolation { reason: String },

    /// The store's internal lock could not be acquired.
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl LineageError {
    /// Shorthand for a missing agent.
    pub fn agent_not_found(id: impl Into<String>) -> Self {
        LineageError::NotFound { entity: EntityKind::Agent, id: id.into() }
    }

    /// Return true for errors that indicate corrupted graph state rather than
    /// a rejected request. These warrant operator alerting.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            LineageError::CycleDetected { .. }
                | LineageError::DepthExceeded { .. }
                | LineageError::IntegrityViolation { .. }
        )
    }
}

/// Convenience alias used throughout the Lineage crates.
pub type LineageResult<T> = Result<T, LineageError>;
