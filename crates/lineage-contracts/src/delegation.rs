//! Delegation edges and rendered delegation chains.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{short_token, AgentId};

/// Unique identifier for one parent→child delegation edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelegationId(pub String);

impl DelegationId {
    pub fn random() -> Self {
        Self(format!("del_{}", short_token()))
    }
}

impl fmt::Display for DelegationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable record that `parent_id` spawned `child_id`.
///
/// A child has at most one inbound edge, so the edges form a forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegation_id: DelegationId,
    pub parent_id: AgentId,
    pub child_id: AgentId,
    pub delegated_at: DateTime<Utc>,
    /// Distance from the nearest root ancestor. 0 when the parent is itself
    /// a root (human- or policy-authorized).
    pub depth: u32,
}

/// Whether a chain link is the human principal or a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainLinkKind {
    Human,
    Agent,
}

/// One hop in a rendered delegation chain, root first.
///
/// The human link carries the principal string from the root agent's
/// `created_by`; agent links carry the agent ID and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    #[serde(rename = "type")]
    pub kind: ChainLinkKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl ChainLink {
    pub fn human(principal: impl Into<String>) -> Self {
        Self { kind: ChainLinkKind::Human, id: principal.into(), name: None }
    }

    pub fn agent(agent_id: &AgentId, name: impl Into<String>) -> Self {
        Self {
            kind: ChainLinkKind::Agent,
            id: agent_id.0.clone(),
            name: Some(name.into()),
        }
    }
}
