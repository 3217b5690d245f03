//! Environment seams for the Lineage core.
//!
//! The core owns no I/O. Everything it needs from its surroundings comes in
//! through these three traits:
//!
//! - `Clock`: monotonic wall-clock timestamps
//! - `IdSource`: unique identifiers for agents, delegations, and logs
//! - `RegistryPolicy`: depth bound and human attribution rules
//!
//! Default implementations live in `defaults`.

use chrono::{DateTime, Utc};

use lineage_contracts::{agent::AgentId, audit::LogId, delegation::DelegationId};

/// A source of timestamps that never go backwards.
pub trait Clock: Send + Sync {
    /// Return the current time. Successive calls must be non-decreasing.
    fn now(&self) -> DateTime<Utc>;
}

/// A source of unique identifiers.
///
/// Implementations must never hand out the same value twice for the lifetime
/// of a registry.
pub trait IdSource: Send + Sync {
    fn agent_id(&self) -> AgentId;
    fn delegation_id(&self) -> DelegationId;
    fn log_id(&self) -> LogId;
}

/// Deployment policy consulted on registration and spawn.
///
/// Implementations are **trusted** and must be deterministic; they are called
/// while the registry holds its write lock.
pub trait RegistryPolicy: Send + Sync {
    /// Maximum number of delegation hops between a root and any agent.
    ///
    /// A spawn that would create a longer chain is rejected, and a chain walk
    /// that needs more hops is reported as a broken chain.
    fn max_delegation_depth(&self) -> u32;

    /// Return true if `principal` is a recognizable human identifier.
    fn is_human_principal(&self, principal: &str) -> bool;

    /// When true, human-authorized registrations must name a principal that
    /// passes `is_human_principal`.
    fn requires_human_principal(&self) -> bool;

    /// When false, staged registrations (starting in `provisioned`) are refused.
    fn allows_staged_registration(&self) -> bool;
}
