//! Scope Authority: attenuation checks and effective-scope computation.
//!
//! Pure functions with no state of their own. A delegation chain may only
//! narrow authority at each hop, so an agent's effective scope is never wider
//! than any of its ancestors'.

use serde::{Deserialize, Serialize};

use lineage_contracts::{
    agent::{Agent, AgentId, LifecycleState},
    error::{LineageError, LineageResult},
    scope::Scope,
};

/// Check that `requested` is a subset of `parent`.
///
/// On violation returns `ScopeAttenuationViolation` listing every requested
/// entry the parent does not hold, in sorted order. Non-emptiness of
/// `requested` is guaranteed by `Scope` construction.
pub fn validate_attenuation(parent: &Scope, requested: &Scope) -> LineageResult<()> {
    let rejected = requested.entries_missing_from(parent);
    if rejected.is_empty() {
        Ok(())
    } else {
        Err(LineageError::ScopeAttenuationViolation { rejected })
    }
}

/// Intersection of every scope along a root-first chain.
///
/// Equal to the last agent's own scope whenever attenuation held at every
/// hop; narrower if a restored graph granted more than an ancestor holds.
pub fn effective_scope(chain: &[&Agent]) -> Vec<String> {
    let Some(last) = chain.last() else {
        return Vec::new();
    };
    last.scope
        .iter()
        .filter(|perm| chain.iter().all(|a| a.scope.contains(perm)))
        .map(str::to_string)
        .collect()
}

/// Result of asking whether an agent may perform an action right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeCheck {
    pub agent_id: AgentId,
    pub action: String,
    /// True only if the action is in scope and the agent is active.
    pub allowed: bool,
    /// True if the action is in the agent's scope, regardless of state.
    pub in_scope: bool,
    pub state: LifecycleState,
    pub agent_scope: Vec<String>,
}

/// The action gate: scope membership plus lifecycle state.
pub fn check_scope(agent: &Agent, action: &str) -> ScopeCheck {
    let in_scope = agent.scope.contains(action);
    ScopeCheck {
        agent_id: agent.agent_id.clone(),
        action: action.to_string(),
        allowed: in_scope && agent.is_active(),
        in_scope,
        state: agent.state,
        agent_scope: agent.scope.to_vec(),
    }
}
