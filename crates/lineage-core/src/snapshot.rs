//! Snapshot export and verified restore.
//!
//! A `RegistrySnapshot` is the registry's full state as plain data. Restoring
//! one rebuilds the indexes and re-checks every structural invariant before
//! the new registry accepts a single request:
//!
//! 1. Agent IDs are unique; each child has at most one inbound edge.
//! 2. Edge endpoints exist; every edge's child is `delegated` and holds no
//!    scope entry its parent lacks.
//! 3. Every `delegated` agent has an inbound edge; roots have none.
//! 4. Every chain reaches a root within the policy's depth bound, without
//!    cycles.
//! 5. Every recorded `depth` matches the one recomputed from the chain.
//! 6. `terminated_at` is set exactly when an agent is `terminated`.
//!
//! Restore is also how a repaired graph is put into service: stored audit
//! records keep their write-time attribution, while live resolution follows
//! the repaired edges.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use lineage_contracts::{
    agent::{Agent, AgentId, AuthoritySource, LifecycleState},
    delegation::Delegation,
    error::{LineageError, LineageResult},
};

use crate::{
    graph::DelegationGraph,
    identity::IdentityStore,
    registry::{Registry, RegistryState},
    traits::{Clock, IdSource, RegistryPolicy},
};

/// The registry's agents and delegation edges as plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Sorted by `(created_at, agent_id)`.
    pub agents: Vec<Agent>,
    /// Sorted by `(delegated_at, delegation_id)`.
    pub delegations: Vec<Delegation>,
}

impl RegistrySnapshot {
    pub fn to_json(&self) -> LineageResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LineageError::ConfigError {
            reason: format!("failed to serialize registry snapshot: {}", e),
        })
    }

    pub fn from_json(s: &str) -> LineageResult<Self> {
        serde_json::from_str(s).map_err(|e| LineageError::ConfigError {
            reason: format!("failed to parse registry snapshot: {}", e),
        })
    }
}

impl Registry {
    /// Capture the current state under one read lock.
    pub fn snapshot(&self) -> LineageResult<RegistrySnapshot> {
        let state = self.read()?;

        let mut agents: Vec<Agent> = state.identities.iter().cloned().collect();
        agents.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });

        let mut delegations: Vec<Delegation> = state.graph.iter().cloned().collect();
        delegations.sort_by(|a, b| {
            a.delegated_at
                .cmp(&b.delegated_at)
                .then_with(|| a.delegation_id.cmp(&b.delegation_id))
        });

        Ok(RegistrySnapshot { agents, delegations })
    }

    /// Build a registry from `snapshot`, verifying every invariant first.
    ///
    /// Fails with `IntegrityViolation`, `DuplicateChild`, `CycleDetected`, or
    /// `DepthExceeded` naming the first problem found.
    pub fn restore(
        snapshot: RegistrySnapshot,
        policy: Box<dyn RegistryPolicy>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdSource>,
    ) -> LineageResult<Self> {
        let state = verify(snapshot, policy.as_ref()).inspect_err(|e| {
            error!(error = %e, "registry snapshot rejected");
        })?;

        info!(
            agents = state.identities.len(),
            delegations = state.graph.len(),
            "registry restored from snapshot"
        );
        Ok(Registry::from_state(state, policy, clock, ids))
    }
}

fn verify(snapshot: RegistrySnapshot, policy: &dyn RegistryPolicy) -> LineageResult<RegistryState> {
    let max_depth = policy.max_delegation_depth();
    let mut identities = IdentityStore::new();
    let mut graph = DelegationGraph::new();

    for agent in snapshot.agents {
        let terminated = agent.state == LifecycleState::Terminated;
        if terminated != agent.terminated_at.is_some() {
            return Err(violation(format!(
                "agent '{}' is {} but terminated_at is {}",
                agent.agent_id,
                agent.state,
                if agent.terminated_at.is_some() { "set" } else { "missing" }
            )));
        }
        identities.insert(agent)?;
    }

    for delegation in snapshot.delegations {
        let parent = identities.get(&delegation.parent_id).map_err(|_| {
            violation(format!(
                "delegation '{}' names unknown parent '{}'",
                delegation.delegation_id, delegation.parent_id
            ))
        })?;
        let child = identities.get(&delegation.child_id).map_err(|_| {
            violation(format!(
                "delegation '{}' names unknown child '{}'",
                delegation.delegation_id, delegation.child_id
            ))
        })?;
        if child.authority_source != AuthoritySource::Delegated {
            return Err(violation(format!(
                "{}-authorized agent '{}' has an inbound delegation",
                child.authority_source, child.agent_id
            )));
        }
        let widened = child.scope.entries_missing_from(&parent.scope);
        if !widened.is_empty() {
            return Err(violation(format!(
                "agent '{}' holds [{}] not granted by its parent '{}'",
                child.agent_id,
                widened.join(", "),
                parent.agent_id
            )));
        }
        graph.insert_edge(delegation)?;
    }

    // Sorted so that the first problem reported does not depend on hashing.
    let mut agent_ids: Vec<&AgentId> = identities.iter().map(|a| &a.agent_id).collect();
    agent_ids.sort();

    for agent_id in agent_ids {
        let edge = graph.delegation_of(agent_id);
        let delegated = identities.get(agent_id)?.authority_source == AuthoritySource::Delegated;
        if delegated && edge.is_none() {
            return Err(violation(format!(
                "delegated agent '{}' has no inbound delegation",
                agent_id
            )));
        }

        // Catches cycles and over-long or broken chains.
        let chain = graph.ancestor_chain(&identities, agent_id, max_depth)?;

        if let Some(edge) = edge {
            // A delegated chain holds at least its root and the agent itself.
            let expected = chain.len().saturating_sub(2) as u32;
            if edge.depth != expected {
                return Err(violation(format!(
                    "delegation '{}' records depth {} but its chain implies {}",
                    edge.delegation_id, edge.depth, expected
                )));
            }
        }
    }

    Ok(RegistryState { identities, graph })
}

fn violation(reason: String) -> LineageError {
    LineageError::IntegrityViolation { reason }
}
