//! Agent identity and lifecycle types.
//!
//! An `Agent` is the unit of accountability: every recorded action names
//! one, and every agent names the principal that created it. These types carry
//! no behaviour beyond validation of the lifecycle state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// Opaque, unique identifier for a registered agent.
///
/// Generated by the registry at creation time and never reused.
/// Example: AgentId("agent_3f9a0c1d2b4e5f60")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create a new random agent ID.
    pub fn random() -> Self {
        Self(format!("agent_{}", short_token()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 16 lowercase hex characters taken from a fresh v4 UUID.
pub(crate) fn short_token() -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(16);
    token
}

/// Informational classification of an agent. Not enforced by any logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    Autonomous,
    SemiAutonomous,
    Tool,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentKind::Autonomous => "autonomous",
            AgentKind::SemiAutonomous => "semi-autonomous",
            AgentKind::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// Where an agent's authority comes from.
///
/// - `Human`: registered directly on behalf of a human principal; a chain root.
/// - `Delegated`: spawned by another agent; has exactly one parent edge.
/// - `Policy`: registered by an automated policy; a chain root with no
///   human behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthoritySource {
    Human,
    Delegated,
    Policy,
}

impl AuthoritySource {
    /// Return true if agents with this source sit at the root of a chain.
    pub fn is_root(self) -> bool {
        !matches!(self, AuthoritySource::Delegated)
    }
}

impl fmt::Display for AuthoritySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthoritySource::Human => "human",
            AuthoritySource::Delegated => "delegated",
            AuthoritySource::Policy => "policy",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of an agent.
///
/// ```text
/// provisioned ──► active ◄──► suspended
///      │            │             │
///      └────────────┴─────────────┴──► terminated
/// ```
///
/// `Terminated` is one-way: no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Provisioned,
    Active,
    Suspended,
    Terminated,
}

impl LifecycleState {
    /// Return true if the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Provisioned, Active)
                | (Provisioned, Terminated)
                | (Active, Suspended)
                | (Active, Terminated)
                | (Suspended, Active)
                | (Suspended, Terminated)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Terminated
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Provisioned => "provisioned",
            LifecycleState::Active => "active",
            LifecycleState::Suspended => "suspended",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// A registered principal capable of acting and of spawning other agents.
///
/// Everything except `state` and `terminated_at` is fixed at creation.
/// Scope changes require registering a new agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    /// Display label. Not unique.
    pub name: String,
    pub kind: AgentKind,
    pub created_at: DateTime<Utc>,
    /// The human principal (e.g. "user:jun@example.org") or parent agent ID
    /// that created this agent.
    pub created_by: String,
    pub authority_source: AuthoritySource,
    pub scope: Scope,
    pub state: LifecycleState,
    /// Set exactly once, on the transition into `Terminated`.
    pub terminated_at: Option<DateTime<Utc>>,
}

impl Agent {
    /// Return true if the agent may currently act or spawn.
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }
}
