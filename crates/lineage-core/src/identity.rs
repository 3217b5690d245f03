//! Identity Store: the record of every agent ever registered.
//!
//! Agents are never removed. The only fields that change after creation are
//! `state` and `terminated_at`, and only through `set_state`, which enforces
//! the lifecycle transition table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lineage_contracts::{
    agent::{Agent, AgentId, AgentKind, AuthoritySource, LifecycleState},
    error::{LineageError, LineageResult},
    scope::Scope,
};

use crate::traits::RegistryPolicy;

/// A request to register a root agent directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub kind: AgentKind,
    /// Human principal or policy identifier responsible for the agent.
    pub created_by: String,
    pub authority_source: AuthoritySource,
    /// Raw permission strings; validated into a `Scope` on registration.
    pub scope: Vec<String>,
    /// When true the agent starts `provisioned` and must be activated.
    #[serde(default)]
    pub staged: bool,
}

impl Registration {
    /// A human-authorized registration that starts active.
    pub fn human<I, S>(name: impl Into<String>, kind: AgentKind, created_by: impl Into<String>, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            created_by: created_by.into(),
            authority_source: AuthoritySource::Human,
            scope: scope.into_iter().map(Into::into).collect(),
            staged: false,
        }
    }

    /// A policy-authorized registration that starts active.
    pub fn policy<I, S>(name: impl Into<String>, kind: AgentKind, created_by: impl Into<String>, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            authority_source: AuthoritySource::Policy,
            ..Self::human(name, kind, created_by, scope)
        }
    }

    /// Start the agent in `provisioned` instead of `active`.
    pub fn staged(mut self) -> Self {
        self.staged = true;
        self
    }

    /// Validate the request against `policy` and return its scope.
    ///
    /// Fails with:
    /// - `InvalidAuthoritySource` for `delegated` (only spawn creates those),
    ///   or for `human` with a principal the policy does not recognize
    /// - `InvalidScope` for an empty or malformed scope
    /// - `ConfigError` for a staged request the policy does not allow
    pub fn validate(&self, policy: &dyn RegistryPolicy) -> LineageResult<Scope> {
        if self.created_by.trim().is_empty() {
            return Err(LineageError::InvalidAuthoritySource {
                reason: "created_by must name a principal".to_string(),
            });
        }

        match self.authority_source {
            AuthoritySource::Delegated => {
                return Err(LineageError::InvalidAuthoritySource {
                    reason: "delegated agents can only be created by spawning from a parent"
                        .to_string(),
                });
            }
            AuthoritySource::Human
                if policy.requires_human_principal()
                    && !policy.is_human_principal(&self.created_by) =>
            {
                return Err(LineageError::InvalidAuthoritySource {
                    reason: format!(
                        "'{}' is not a recognized human principal",
                        self.created_by
                    ),
                });
            }
            _ => {}
        }

        if self.staged && !policy.allows_staged_registration() {
            return Err(LineageError::ConfigError {
                reason: "staged registration is disabled by policy".to_string(),
            });
        }

        Scope::new(self.scope.iter().cloned())
    }
}

/// All registered agents, keyed by ID.
///
/// The store itself is not synchronized; the `Registry` guards it.
#[derive(Debug, Default, Clone)]
pub struct IdentityStore {
    agents: HashMap<AgentId, Agent>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-built agent.
    ///
    /// Returns `IntegrityViolation` if the ID is already taken, which means
    /// the `IdSource` handed out a duplicate.
    pub fn insert(&mut self, agent: Agent) -> LineageResult<()> {
        if self.agents.contains_key(&agent.agent_id) {
            return Err(LineageError::IntegrityViolation {
                reason: format!("agent ID '{}' issued twice", agent.agent_id),
            });
        }
        self.agents.insert(agent.agent_id.clone(), agent);
        Ok(())
    }

    /// Undo an `insert` made earlier under the same lock.
    ///
    /// Only the registry calls this, to roll back a spawn whose edge could not
    /// be recorded.
    pub(crate) fn remove(&mut self, agent_id: &AgentId) -> Option<Agent> {
        self.agents.remove(agent_id)
    }

    /// Look up an agent, failing with `NotFound` if absent.
    pub fn get(&self, agent_id: &AgentId) -> LineageResult<&Agent> {
        self.agents
            .get(agent_id)
            .ok_or_else(|| LineageError::agent_not_found(agent_id.as_str()))
    }

    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.agents.contains_key(agent_id)
    }

    /// Fail with `InvalidTransition` unless the agent may move to `next`.
    pub fn check_transition(&self, agent_id: &AgentId, next: LifecycleState) -> LineageResult<()> {
        let agent = self.get(agent_id)?;
        if agent.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(LineageError::InvalidTransition {
                agent_id: agent_id.0.clone(),
                from: agent.state.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Move an agent to `next`, stamping `terminated_at` on termination.
    ///
    /// Only the lifecycle manager calls this.
    pub(crate) fn set_state(
        &mut self,
        agent_id: &AgentId,
        next: LifecycleState,
        now: DateTime<Utc>,
    ) -> LineageResult<&Agent> {
        self.check_transition(agent_id, next)?;

        let agent = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| LineageError::agent_not_found(agent_id.as_str()))?;
        agent.state = next;
        if next == LifecycleState::Terminated {
            agent.terminated_at = Some(now);
        }
        Ok(agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
