//! Lifecycle Manager: state transitions, including cascade termination.
//!
//! Every function here validates the full set of transitions it is about to
//! make before changing anything, so a failed call leaves every agent in the
//! state it started in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lineage_contracts::{
    agent::{Agent, AgentId, LifecycleState},
    error::{LineageError, LineageResult},
};

use crate::{graph::DelegationGraph, identity::IdentityStore};

/// The agents a `terminate` call changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationReport {
    /// Agents moved to `terminated` by this call; the target comes first,
    /// then descendants breadth first.
    pub terminated: Vec<AgentId>,
    /// Descendants that were already terminated and were left as they were.
    pub skipped: Vec<AgentId>,
    pub cascade: bool,
}

impl TerminationReport {
    pub fn count(&self) -> usize {
        self.terminated.len()
    }
}

/// `provisioned → active`, for agents registered in staged mode.
pub fn activate(
    identities: &mut IdentityStore,
    agent_id: &AgentId,
    now: DateTime<Utc>,
) -> LineageResult<Agent> {
    transition(identities, agent_id, LifecycleState::Active, LifecycleState::Provisioned, now)
}

/// `active → suspended`.
pub fn suspend(
    identities: &mut IdentityStore,
    agent_id: &AgentId,
    now: DateTime<Utc>,
) -> LineageResult<Agent> {
    transition(identities, agent_id, LifecycleState::Suspended, LifecycleState::Active, now)
}

/// `suspended → active`.
pub fn reinstate(
    identities: &mut IdentityStore,
    agent_id: &AgentId,
    now: DateTime<Utc>,
) -> LineageResult<Agent> {
    transition(identities, agent_id, LifecycleState::Active, LifecycleState::Suspended, now)
}

/// Apply `next` only when the agent is currently in `required`.
///
/// `activate` and `reinstate` both target `Active`; each is valid only from
/// its own source state.
fn transition(
    identities: &mut IdentityStore,
    agent_id: &AgentId,
    next: LifecycleState,
    required: LifecycleState,
    now: DateTime<Utc>,
) -> LineageResult<Agent> {
    let current = identities.get(agent_id)?.state;
    if current != required {
        return Err(LineageError::InvalidTransition {
            agent_id: agent_id.0.clone(),
            from: current.to_string(),
            to: next.to_string(),
        });
    }

    let agent = identities.set_state(agent_id, next, now)?.clone();
    debug!(agent_id = %agent_id, from = %current, to = %next, "lifecycle transition");
    Ok(agent)
}

/// Terminate `agent_id`, and with `cascade` every transitive descendant.
///
/// The target must be in a state that can move to `terminated`; a target
/// that is already terminated is an `InvalidTransition`. Descendants that are
/// already terminated are skipped. All transitions are checked before any is
/// applied, so the call either terminates the whole set or changes nothing.
///
/// Without `cascade`, descendants keep their state; their chains still
/// resolve through the terminated agent.
pub fn terminate(
    identities: &mut IdentityStore,
    graph: &DelegationGraph,
    agent_id: &AgentId,
    cascade: bool,
    now: DateTime<Utc>,
) -> LineageResult<TerminationReport> {
    identities.check_transition(agent_id, LifecycleState::Terminated)?;

    let mut targets = vec![agent_id.clone()];
    let mut skipped = Vec::new();

    if cascade {
        for descendant in graph.descendants(agent_id) {
            if identities.get(&descendant)?.state.is_terminal() {
                skipped.push(descendant);
            } else {
                identities.check_transition(&descendant, LifecycleState::Terminated)?;
                targets.push(descendant);
            }
        }
    }

    // Every transition is known to be valid from here on.
    for target in &targets {
        identities.set_state(target, LifecycleState::Terminated, now)?;
    }

    info!(
        agent_id = %agent_id,
        cascade,
        terminated = targets.len(),
        skipped = skipped.len(),
        "agent terminated"
    );

    Ok(TerminationReport { terminated: targets, skipped, cascade })
}
