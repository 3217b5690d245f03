//! The Lineage registry: the single consistent authority over agent state.
//!
//! `Registry` composes the identity store, delegation graph, scope authority,
//! and lifecycle manager behind one `RwLock`. Each mutating operation runs
//! inside a single write-lock scope:
//!
//!   register  → validate → insert agent
//!   spawn     → parent active → attenuate → depth bound → insert child + edge
//!   terminate → validate subtree → terminate subtree
//!
//! A failed operation returns before anything is written, so no caller can
//! observe a child without its edge or a half-terminated subtree.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use lineage_contracts::{
    agent::{Agent, AgentId, AgentKind, AuthoritySource, LifecycleState},
    delegation::{ChainLink, Delegation},
    error::{LineageError, LineageResult},
    scope::Scope,
};

use crate::{
    defaults::{DefaultPolicy, MonotonicClock, RandomIds},
    graph::{self, DelegationGraph},
    identity::{IdentityStore, Registration},
    lifecycle::{self, TerminationReport},
    scope::{self as authority, ScopeCheck},
    traits::{Clock, IdSource, RegistryPolicy},
};

/// Everything guarded by the registry lock.
#[derive(Debug, Default, Clone)]
pub(crate) struct RegistryState {
    pub(crate) identities: IdentityStore,
    pub(crate) graph: DelegationGraph,
}

/// A request to spawn a delegated child from an existing agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub name: String,
    pub kind: AgentKind,
    /// Must be a subset of the parent's scope.
    pub scope: Vec<String>,
}

impl SpawnRequest {
    pub fn new<I, S>(name: impl Into<String>, kind: AgentKind, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            scope: scope.into_iter().map(Into::into).collect(),
        }
    }
}

/// The result of a successful spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnOutcome {
    pub agent: Agent,
    pub delegation: Delegation,
    /// The child's full chain, root first.
    pub delegation_chain: Vec<ChainLink>,
}

/// How a resolved chain attributes an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// Root first; ends with the queried agent.
    pub chain: Vec<Agent>,
    pub links: Vec<ChainLink>,
    /// The root human principal, `None` for policy-rooted chains.
    pub human_authority: Option<String>,
    pub effective_scope: Vec<String>,
    /// Depth of the inbound delegation; `None` for roots.
    pub delegation_depth: Option<u32>,
}

/// Agent counts by lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCounts {
    pub total: usize,
    pub provisioned: usize,
    pub active: usize,
    pub suspended: usize,
    pub terminated: usize,
    pub delegations: usize,
}

/// The shared, thread-safe agent registry.
///
/// Construct one per process at the composition root and share it by
/// reference (or `Arc`). There is no global instance.
pub struct Registry {
    state: RwLock<RegistryState>,
    policy: Box<dyn RegistryPolicy>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdSource>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(
            Box::new(DefaultPolicy),
            Box::new(MonotonicClock::new()),
            Box::new(RandomIds),
        )
    }
}

impl Registry {
    /// Create an empty registry with the given environment seams.
    pub fn new(
        policy: Box<dyn RegistryPolicy>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdSource>,
    ) -> Self {
        Self::from_state(RegistryState::default(), policy, clock, ids)
    }

    pub(crate) fn from_state(
        state: RegistryState,
        policy: Box<dyn RegistryPolicy>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdSource>,
    ) -> Self {
        Self { state: RwLock::new(state), policy, clock, ids }
    }

    pub fn policy(&self) -> &dyn RegistryPolicy {
        self.policy.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn ids(&self) -> &dyn IdSource {
        self.ids.as_ref()
    }

    // ── Lock helpers ─────────────────────────────────────────────────────────

    pub(crate) fn read(&self) -> LineageResult<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|e| LineageError::StoreUnavailable {
            reason: format!("registry lock poisoned: {}", e),
        })
    }

    fn write(&self) -> LineageResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|e| LineageError::StoreUnavailable {
            reason: format!("registry lock poisoned: {}", e),
        })
    }

    // ── Identity store ───────────────────────────────────────────────────────

    /// Register a root agent (human- or policy-authorized).
    ///
    /// The agent starts `active`, or `provisioned` for staged requests.
    pub fn register(&self, request: Registration) -> LineageResult<Agent> {
        let scope = request.validate(self.policy()).inspect_err(|e| {
            warn!(created_by = %request.created_by, error = %e, "registration rejected");
        })?;

        let mut state = self.write()?;
        let agent = Agent {
            agent_id: self.ids.agent_id(),
            name: request.name,
            kind: request.kind,
            created_at: self.clock.now(),
            created_by: request.created_by,
            authority_source: request.authority_source,
            scope,
            state: if request.staged {
                LifecycleState::Provisioned
            } else {
                LifecycleState::Active
            },
            terminated_at: None,
        };
        state.identities.insert(agent.clone())?;

        info!(
            agent_id = %agent.agent_id,
            created_by = %agent.created_by,
            authority_source = %agent.authority_source,
            scope_size = agent.scope.len(),
            "agent registered"
        );
        Ok(agent)
    }

    /// Look up an agent by ID.
    pub fn get(&self, agent_id: &AgentId) -> LineageResult<Agent> {
        self.read()?.identities.get(agent_id).cloned()
    }

    /// All agents, newest first.
    ///
    /// Without `include_terminated` this is every agent not yet terminated,
    /// so provisioned and suspended agents are listed alongside active ones.
    pub fn list(&self, include_terminated: bool) -> LineageResult<Vec<Agent>> {
        let state = self.read()?;
        let mut agents: Vec<Agent> = state
            .identities
            .iter()
            .filter(|a| include_terminated || !a.state.is_terminal())
            .cloned()
            .collect();
        agents.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.agent_id.cmp(&a.agent_id))
        });
        Ok(agents)
    }

    // ── Delegation ───────────────────────────────────────────────────────────

    /// Spawn a delegated child of `parent_id`.
    ///
    /// Fails with:
    /// - `NotFound` if the parent is unknown
    /// - `AgentNotActive` if the parent is not active
    /// - `InvalidScope` if the requested scope is empty or malformed
    /// - `ScopeAttenuationViolation` if it is not a subset of the parent's
    /// - `DelegationLimit` if the child would sit deeper than the policy allows
    ///
    /// The child and its delegation edge are created under one write lock;
    /// on any failure neither exists.
    pub fn spawn(&self, parent_id: &AgentId, request: SpawnRequest) -> LineageResult<SpawnOutcome> {
        let requested = Scope::new(request.scope.iter().cloned())?;

        let mut state = self.write()?;
        let parent = state.identities.get(parent_id)?.clone();

        if !parent.is_active() {
            warn!(parent_id = %parent_id, state = %parent.state, "spawn from inactive parent rejected");
            return Err(LineageError::AgentNotActive {
                agent_id: parent_id.0.clone(),
                state: parent.state.to_string(),
            });
        }

        authority::validate_attenuation(&parent.scope, &requested).inspect_err(|e| {
            warn!(parent_id = %parent_id, error = %e, "spawn rejected");
        })?;

        let depth = match state.graph.delegation_of(parent_id) {
            Some(edge) => edge.depth + 1,
            None => 0,
        };
        let max_depth = self.policy.max_delegation_depth();
        if depth + 1 > max_depth {
            warn!(parent_id = %parent_id, depth, max_depth, "spawn exceeds delegation depth");
            return Err(LineageError::DelegationLimit {
                parent_id: parent_id.0.clone(),
                max_depth,
            });
        }

        // The parent's own chain must resolve before anything hangs off it.
        let mut delegation_chain = {
            let chain = state
                .graph
                .ancestor_chain(&state.identities, parent_id, max_depth)
                .inspect_err(report_fault)?;
            graph::chain_links(&chain)
        };

        let now = self.clock.now();
        let child = Agent {
            agent_id: self.ids.agent_id(),
            name: request.name,
            kind: request.kind,
            created_at: now,
            created_by: parent_id.0.clone(),
            authority_source: AuthoritySource::Delegated,
            scope: requested,
            state: LifecycleState::Active,
            terminated_at: None,
        };

        let RegistryState { identities, graph } = &mut *state;
        identities.insert(child.clone())?;
        let delegation = match graph.record(
            identities,
            self.ids.delegation_id(),
            parent_id,
            &child.agent_id,
            depth,
            now,
        ) {
            Ok(delegation) => delegation,
            Err(e) => {
                // Still under the write lock: nobody has seen the child.
                identities.remove(&child.agent_id);
                report_fault(&e);
                return Err(e);
            }
        };
        delegation_chain.push(ChainLink::agent(&child.agent_id, child.name.clone()));

        info!(
            parent_id = %parent_id,
            child_id = %child.agent_id,
            depth,
            "agent spawned"
        );
        Ok(SpawnOutcome { agent: child, delegation, delegation_chain })
    }

    /// The agent's chain, root first, ending with the agent itself.
    pub fn ancestor_chain(&self, agent_id: &AgentId) -> LineageResult<Vec<Agent>> {
        let state = self.read()?;
        let chain = state
            .graph
            .ancestor_chain(&state.identities, agent_id, self.policy.max_delegation_depth())
            .inspect_err(report_fault)?;
        Ok(chain.into_iter().cloned().collect())
    }

    /// Resolve an agent's chain, delegation depth, human authority, and
    /// effective scope in one consistent read.
    pub fn resolve(&self, agent_id: &AgentId) -> LineageResult<Resolution> {
        let state = self.read()?;
        let chain = state
            .graph
            .ancestor_chain(&state.identities, agent_id, self.policy.max_delegation_depth())
            .inspect_err(report_fault)?;
        Ok(Resolution {
            links: graph::chain_links(&chain),
            human_authority: graph::human_authority(&chain),
            effective_scope: authority::effective_scope(&chain),
            delegation_depth: state.graph.delegation_of(agent_id).map(|d| d.depth),
            chain: chain.into_iter().cloned().collect(),
        })
    }

    /// The root human principal for `agent_id`, walked fresh from the graph.
    pub fn human_authority(&self, agent_id: &AgentId) -> LineageResult<Option<String>> {
        let state = self.read()?;
        let chain = state
            .graph
            .ancestor_chain(&state.identities, agent_id, self.policy.max_delegation_depth())
            .inspect_err(report_fault)?;
        Ok(graph::human_authority(&chain))
    }

    /// All transitive descendants of `agent_id`, breadth first.
    pub fn descendants(&self, agent_id: &AgentId) -> LineageResult<Vec<AgentId>> {
        let state = self.read()?;
        state.identities.get(agent_id)?;
        Ok(state.graph.descendants(agent_id))
    }

    /// Direct children of `agent_id`, in spawn order.
    pub fn children(&self, agent_id: &AgentId) -> LineageResult<Vec<AgentId>> {
        let state = self.read()?;
        state.identities.get(agent_id)?;
        Ok(state.graph.children_of(agent_id).to_vec())
    }

    /// The inbound delegation of `agent_id`; `None` for roots.
    pub fn delegation_of(&self, agent_id: &AgentId) -> LineageResult<Option<Delegation>> {
        let state = self.read()?;
        state.identities.get(agent_id)?;
        Ok(state.graph.delegation_of(agent_id).cloned())
    }

    /// Depth of the inbound delegation of `agent_id`; `None` for roots.
    pub fn delegation_depth(&self, agent_id: &AgentId) -> LineageResult<Option<u32>> {
        let state = self.read()?;
        state.identities.get(agent_id)?;
        Ok(state.graph.delegation_of(agent_id).map(|d| d.depth))
    }

    // ── Scope authority ──────────────────────────────────────────────────────

    /// Whether `agent_id` may perform `action` right now.
    pub fn check_scope(&self, agent_id: &AgentId, action: &str) -> LineageResult<ScopeCheck> {
        let state = self.read()?;
        let agent = state.identities.get(agent_id)?;
        let check = authority::check_scope(agent, action);
        debug!(agent_id = %agent_id, action, allowed = check.allowed, "scope check");
        Ok(check)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Activate a staged (`provisioned`) agent.
    pub fn activate(&self, agent_id: &AgentId) -> LineageResult<Agent> {
        let mut state = self.write()?;
        lifecycle::activate(&mut state.identities, agent_id, self.clock.now())
    }

    /// Suspend an active agent.
    pub fn suspend(&self, agent_id: &AgentId) -> LineageResult<Agent> {
        let mut state = self.write()?;
        let agent = lifecycle::suspend(&mut state.identities, agent_id, self.clock.now())?;
        info!(agent_id = %agent_id, "agent suspended");
        Ok(agent)
    }

    /// Reinstate a suspended agent.
    pub fn reinstate(&self, agent_id: &AgentId) -> LineageResult<Agent> {
        let mut state = self.write()?;
        let agent = lifecycle::reinstate(&mut state.identities, agent_id, self.clock.now())?;
        info!(agent_id = %agent_id, "agent reinstated");
        Ok(agent)
    }

    /// Terminate an agent, optionally with its whole subtree.
    ///
    /// The write lock is held for the whole cascade, so the subtree is
    /// terminated as a unit.
    pub fn terminate(&self, agent_id: &AgentId, cascade: bool) -> LineageResult<TerminationReport> {
        let mut state = self.write()?;
        let now = self.clock.now();
        let RegistryState { identities, graph } = &mut *state;
        lifecycle::terminate(identities, graph, agent_id, cascade, now).inspect_err(|e| {
            warn!(agent_id = %agent_id, cascade, error = %e, "termination rejected");
        })
    }

    // ── Stats ────────────────────────────────────────────────────────────────

    pub fn counts(&self) -> LineageResult<AgentCounts> {
        let state = self.read()?;
        let mut counts = AgentCounts {
            delegations: state.graph.len(),
            ..AgentCounts::default()
        };
        for agent in state.identities.iter() {
            counts.total += 1;
            match agent.state {
                LifecycleState::Provisioned => counts.provisioned += 1,
                LifecycleState::Active => counts.active += 1,
                LifecycleState::Suspended => counts.suspended += 1,
                LifecycleState::Terminated => counts.terminated += 1,
            }
        }
        Ok(counts)
    }
}

/// Log integrity faults at error level for operator alerting.
pub(crate) fn report_fault(err: &LineageError) {
    if err.is_integrity_fault() {
        error!(error = %err, "delegation graph integrity fault");
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lineage_contracts::{
        agent::{AgentId, AgentKind, AuthoritySource, LifecycleState},
        delegation::ChainLinkKind,
        error::LineageError,
    };

    use crate::{
        defaults::{DefaultPolicy, MonotonicClock, SequentialIds},
        identity::Registration,
        traits::RegistryPolicy,
    };

    use super::{Registry, SpawnRequest};

    const JUN: &str = "user:jun@example.org";

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn registry() -> Registry {
        Registry::new(
            Box::new(DefaultPolicy),
            Box::new(MonotonicClock::new()),
            Box::new(SequentialIds::new()),
        )
    }

    /// A policy with a configurable depth bound and no principal format rule.
    struct ShallowPolicy {
        max_depth: u32,
    }

    impl RegistryPolicy for ShallowPolicy {
        fn max_delegation_depth(&self) -> u32 {
            self.max_depth
        }

        fn is_human_principal(&self, _principal: &str) -> bool {
            true
        }

        fn requires_human_principal(&self) -> bool {
            false
        }

        fn allows_staged_registration(&self) -> bool {
            false
        }
    }

    /// Agent A from the end-to-end scenarios.
    fn register_analyzer(registry: &Registry) -> AgentId {
        registry
            .register(Registration::human(
                "DataAnalyzer",
                AgentKind::Autonomous,
                JUN,
                ["read:db", "write:reports", "create:charts"],
            ))
            .unwrap()
            .agent_id
    }

    fn spawn(registry: &Registry, parent: &AgentId, name: &str, scope: &[&str]) -> AgentId {
        registry
            .spawn(parent, SpawnRequest::new(name, AgentKind::Tool, scope.iter().copied()))
            .unwrap()
            .agent
            .agent_id
    }

    // ── Registration ─────────────────────────────────────────────────────────

    #[test]
    fn test_register_human_agent() {
        let registry = registry();
        let id = register_analyzer(&registry);

        let agent = registry.get(&id).unwrap();
        assert_eq!(agent.state, LifecycleState::Active);
        assert_eq!(agent.authority_source, AuthoritySource::Human);
        assert_eq!(agent.created_by, JUN);
        assert!(agent.terminated_at.is_none());
        assert_eq!(agent.agent_id.0, "agent_0000000000000001");

        // A root's chain is just itself.
        let chain = registry.ancestor_chain(&id).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].agent_id, id);
        assert!(registry.delegation_of(&id).unwrap().is_none());
    }

    #[test]
    fn test_register_rejects_unrecognized_human_principal() {
        let registry = registry();
        let err = registry
            .register(Registration::human("Bot", AgentKind::Tool, "jun", ["read:db"]))
            .unwrap_err();
        assert!(matches!(err, LineageError::InvalidAuthoritySource { .. }));
        assert_eq!(registry.counts().unwrap().total, 0);
    }

    #[test]
    fn test_register_rejects_delegated_source() {
        let registry = registry();
        let mut request = Registration::human("Bot", AgentKind::Tool, JUN, ["read:db"]);
        request.authority_source = AuthoritySource::Delegated;

        let err = registry.register(request).unwrap_err();
        assert!(matches!(err, LineageError::InvalidAuthoritySource { .. }));
    }

    #[test]
    fn test_register_rejects_invalid_scope() {
        let registry = registry();

        let empty = Registration::human("Bot", AgentKind::Tool, JUN, Vec::<String>::new());
        assert!(matches!(
            registry.register(empty).unwrap_err(),
            LineageError::InvalidScope { .. }
        ));

        let malformed = Registration::human("Bot", AgentKind::Tool, JUN, ["read db"]);
        assert!(matches!(
            registry.register(malformed).unwrap_err(),
            LineageError::InvalidScope { .. }
        ));
    }

    #[test]
    fn test_policy_root_has_no_human_authority() {
        let registry = registry();
        let root = registry
            .register(Registration::policy(
                "NightlyJob",
                AgentKind::Autonomous,
                "policy:nightly-reports",
                ["write:reports"],
            ))
            .unwrap();
        let child = spawn(&registry, &root.agent_id, "Writer", &["write:reports"]);

        assert_eq!(registry.human_authority(&child).unwrap(), None);
        let resolution = registry.resolve(&child).unwrap();
        assert_eq!(resolution.chain.len(), 2);
        // No human link for a policy-rooted chain.
        assert!(resolution.links.iter().all(|l| l.kind == ChainLinkKind::Agent));
        assert_eq!(resolution.delegation_depth, Some(0));

        let root_resolution = registry.resolve(&root.agent_id).unwrap();
        assert_eq!(root_resolution.delegation_depth, None);
        assert_eq!(root_resolution.chain.len(), 1);
    }

    #[test]
    fn test_staged_registration_requires_activation() {
        let registry = registry();
        let staged = registry
            .register(Registration::human("Stager", AgentKind::Tool, JUN, ["read:db"]).staged())
            .unwrap();
        assert_eq!(staged.state, LifecycleState::Provisioned);

        let err = registry
            .spawn(&staged.agent_id, SpawnRequest::new("Early", AgentKind::Tool, ["read:db"]))
            .unwrap_err();
        assert!(matches!(err, LineageError::AgentNotActive { .. }));

        // Suspension is only reachable from active.
        assert!(matches!(
            registry.suspend(&staged.agent_id).unwrap_err(),
            LineageError::InvalidTransition { .. }
        ));

        let active = registry.activate(&staged.agent_id).unwrap();
        assert_eq!(active.state, LifecycleState::Active);
        assert!(registry.activate(&staged.agent_id).is_err());
    }

    #[test]
    fn test_staged_registration_can_be_disabled() {
        let registry = Registry::new(
            Box::new(ShallowPolicy { max_depth: 4 }),
            Box::new(MonotonicClock::new()),
            Box::new(SequentialIds::new()),
        );
        let err = registry
            .register(Registration::human("Stager", AgentKind::Tool, "jun", ["read:db"]).staged())
            .unwrap_err();
        assert!(matches!(err, LineageError::ConfigError { .. }));
    }

    // ── Spawn and attenuation ────────────────────────────────────────────────

    /// A → B with {write:reports} succeeds at depth 0; B → {create:charts}
    /// fails listing the rejected permission and changes nothing.
    #[test]
    fn test_spawn_attenuation_scenario() {
        let registry = registry();
        let a = register_analyzer(&registry);

        let outcome = registry
            .spawn(&a, SpawnRequest::new("ReportGenerator", AgentKind::Tool, ["write:reports"]))
            .unwrap();
        let b = outcome.agent.agent_id.clone();
        assert_eq!(outcome.delegation.depth, 0);
        assert_eq!(outcome.delegation.parent_id, a);
        assert_eq!(outcome.agent.authority_source, AuthoritySource::Delegated);
        assert_eq!(outcome.agent.created_by, a.0);

        let before = registry.counts().unwrap();
        let err = registry
            .spawn(&b, SpawnRequest::new("ChartMaker", AgentKind::Tool, ["create:charts"]))
            .unwrap_err();
        match err {
            LineageError::ScopeAttenuationViolation { rejected } => {
                assert_eq!(rejected, vec!["create:charts".to_string()]);
            }
            other => panic!("expected ScopeAttenuationViolation, got {:?}", other),
        }
        assert_eq!(registry.counts().unwrap(), before);
        assert!(registry.children(&b).unwrap().is_empty());
    }

    #[test]
    fn test_spawn_reports_full_chain() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "ReportGenerator", &["write:reports", "read:db"]);

        let outcome = registry
            .spawn(&b, SpawnRequest::new("Reader", AgentKind::Tool, ["read:db"]))
            .unwrap();
        assert_eq!(outcome.delegation.depth, 1);

        let links = &outcome.delegation_chain;
        assert_eq!(links.len(), 4, "human, A, B, child");
        assert_eq!(links[0].kind, ChainLinkKind::Human);
        assert_eq!(links[0].id, JUN);
        assert_eq!(links[1].id, a.0);
        assert_eq!(links[2].id, b.0);
        assert_eq!(links[3].id, outcome.agent.agent_id.0);
        assert_eq!(links[3].name.as_deref(), Some("Reader"));
    }

    #[test]
    fn test_ancestor_chain_starts_at_human_root() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "B", &["read:db", "write:reports"]);
        let c = spawn(&registry, &b, "C", &["read:db"]);
        let d = spawn(&registry, &c, "D", &["read:db"]);

        for id in [&a, &b, &c, &d] {
            let chain = registry.ancestor_chain(id).unwrap();
            assert_eq!(chain[0].authority_source, AuthoritySource::Human);
            assert_eq!(&chain.last().unwrap().agent_id, id);
        }
        let ids: Vec<AgentId> = registry
            .ancestor_chain(&d)
            .unwrap()
            .into_iter()
            .map(|a| a.agent_id)
            .collect();
        assert_eq!(ids, vec![a.clone(), b.clone(), c, d.clone()]);
        assert_eq!(registry.human_authority(&d).unwrap().as_deref(), Some(JUN));

        assert_eq!(registry.delegation_depth(&a).unwrap(), None);
        assert_eq!(registry.delegation_depth(&b).unwrap(), Some(0));
        assert_eq!(registry.delegation_depth(&d).unwrap(), Some(2));
        assert_eq!(registry.children(&a).unwrap(), vec![b]);
    }

    #[test]
    fn test_spawn_respects_depth_bound() {
        let registry = Registry::new(
            Box::new(ShallowPolicy { max_depth: 2 }),
            Box::new(MonotonicClock::new()),
            Box::new(SequentialIds::new()),
        );
        let root = registry
            .register(Registration::human("Root", AgentKind::Autonomous, "jun", ["read:db"]))
            .unwrap()
            .agent_id;
        let first = spawn(&registry, &root, "First", &["read:db"]);
        let second = spawn(&registry, &first, "Second", &["read:db"]);

        let err = registry
            .spawn(&second, SpawnRequest::new("Third", AgentKind::Tool, ["read:db"]))
            .unwrap_err();
        assert!(matches!(err, LineageError::DelegationLimit { max_depth: 2, .. }));
        assert!(!err.is_integrity_fault());
        assert_eq!(registry.counts().unwrap().total, 3);
    }

    #[test]
    fn test_spawn_from_unknown_parent() {
        let registry = registry();
        let err = registry
            .spawn(
                &AgentId::from("agent_missing"),
                SpawnRequest::new("Orphan", AgentKind::Tool, ["read:db"]),
            )
            .unwrap_err();
        assert!(matches!(err, LineageError::NotFound { .. }));
    }

    #[test]
    fn test_concurrent_spawns_from_same_parent() {
        let registry = Arc::new(registry());
        let a = register_analyzer(&registry);

        std::thread::scope(|s| {
            for i in 0..8 {
                let registry = Arc::clone(&registry);
                let a = a.clone();
                s.spawn(move || {
                    registry
                        .spawn(&a, SpawnRequest::new(format!("worker-{i}"), AgentKind::Tool, ["read:db"]))
                        .unwrap();
                });
            }
        });

        let children = registry.children(&a).unwrap();
        assert_eq!(children.len(), 8);
        let unique: std::collections::HashSet<_> = children.iter().collect();
        assert_eq!(unique.len(), 8);
        assert_eq!(registry.counts().unwrap().delegations, 8);
    }

    // ── Scope gate ───────────────────────────────────────────────────────────

    #[test]
    fn test_check_scope_follows_state() {
        let registry = registry();
        let a = register_analyzer(&registry);

        let check = registry.check_scope(&a, "read:db").unwrap();
        assert!(check.allowed && check.in_scope);
        assert!(!registry.check_scope(&a, "delete:db").unwrap().allowed);

        registry.suspend(&a).unwrap();
        let check = registry.check_scope(&a, "read:db").unwrap();
        assert!(check.in_scope);
        assert!(!check.allowed, "suspended agents may not act");
        assert_eq!(check.state, LifecycleState::Suspended);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    #[test]
    fn test_suspend_and_reinstate() {
        let registry = registry();
        let a = register_analyzer(&registry);

        assert!(matches!(
            registry.reinstate(&a).unwrap_err(),
            LineageError::InvalidTransition { .. }
        ));

        assert_eq!(registry.suspend(&a).unwrap().state, LifecycleState::Suspended);
        assert!(matches!(
            registry.suspend(&a).unwrap_err(),
            LineageError::InvalidTransition { .. }
        ));
        assert_eq!(registry.reinstate(&a).unwrap().state, LifecycleState::Active);
    }

    /// A with children B and C: cascade terminates all three.
    #[test]
    fn test_cascade_termination_scenario() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "ReportGenerator", &["write:reports"]);
        let c = spawn(&registry, &a, "ChartMaker", &["create:charts"]);
        let grandchild = spawn(&registry, &b, "Formatter", &["write:reports"]);

        let report = registry.terminate(&a, true).unwrap();
        assert_eq!(report.terminated, vec![a.clone(), b.clone(), c.clone(), grandchild.clone()]);
        assert_eq!(report.count(), 4);
        assert!(report.skipped.is_empty());

        for id in [&a, &b, &c, &grandchild] {
            let agent = registry.get(id).unwrap();
            assert_eq!(agent.state, LifecycleState::Terminated);
            assert!(agent.terminated_at.is_some());
        }
        assert!(registry.list(false).unwrap().is_empty());
        assert_eq!(registry.list(true).unwrap().len(), 4);
    }

    #[test]
    fn test_terminate_without_cascade_keeps_chain() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "B", &["read:db", "write:reports"]);
        let c = spawn(&registry, &b, "C", &["read:db"]);

        let report = registry.terminate(&b, false).unwrap();
        assert_eq!(report.terminated, vec![b.clone()]);

        assert_eq!(registry.get(&c).unwrap().state, LifecycleState::Active);
        // Resolution walks past the terminated parent to the human root.
        assert_eq!(registry.ancestor_chain(&c).unwrap().len(), 3);
        assert_eq!(registry.human_authority(&c).unwrap().as_deref(), Some(JUN));

        // But the terminated agent cannot spawn.
        let err = registry
            .spawn(&b, SpawnRequest::new("Late", AgentKind::Tool, ["read:db"]))
            .unwrap_err();
        assert!(matches!(err, LineageError::AgentNotActive { .. }));
    }

    #[test]
    fn test_cascade_skips_already_terminated_descendants() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "B", &["read:db"]);
        let c = spawn(&registry, &a, "C", &["read:db"]);
        registry.terminate(&b, false).unwrap();
        let first_stamp = registry.get(&b).unwrap().terminated_at;

        let report = registry.terminate(&a, true).unwrap();
        assert_eq!(report.terminated, vec![a.clone(), c]);
        assert_eq!(report.skipped, vec![b.clone()]);
        // terminated_at is set exactly once.
        assert_eq!(registry.get(&b).unwrap().terminated_at, first_stamp);
    }

    #[test]
    fn test_terminate_twice_is_rejected_without_changes() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "B", &["read:db"]);
        registry.terminate(&a, false).unwrap();

        let err = registry.terminate(&a, true).unwrap_err();
        assert!(matches!(err, LineageError::InvalidTransition { .. }));
        // The failed cascade did not touch the subtree.
        assert_eq!(registry.get(&b).unwrap().state, LifecycleState::Active);

        assert!(matches!(
            registry.reinstate(&a).unwrap_err(),
            LineageError::InvalidTransition { .. }
        ));
    }

    #[test]
    fn test_terminate_suspended_agent() {
        let registry = registry();
        let a = register_analyzer(&registry);
        registry.suspend(&a).unwrap();

        let report = registry.terminate(&a, true).unwrap();
        assert_eq!(report.terminated, vec![a.clone()]);
        assert_eq!(registry.get(&a).unwrap().state, LifecycleState::Terminated);
    }

    #[test]
    fn test_descendants_and_counts() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "B", &["read:db"]);
        let c = spawn(&registry, &b, "C", &["read:db"]);
        let other = register_analyzer(&registry);

        assert_eq!(registry.descendants(&a).unwrap(), vec![b.clone(), c.clone()]);
        assert!(registry.descendants(&c).unwrap().is_empty());
        assert!(registry.descendants(&other).unwrap().is_empty());
        assert!(registry.descendants(&AgentId::from("agent_missing")).is_err());

        registry.suspend(&other).unwrap();
        let counts = registry.counts().unwrap();
        assert_eq!(counts.total, 4);
        assert_eq!(counts.active, 3);
        assert_eq!(counts.suspended, 1);
        assert_eq!(counts.delegations, 2);
    }

    #[test]
    fn test_list_excludes_only_terminated() {
        let registry = registry();
        let a = register_analyzer(&registry);
        let b = spawn(&registry, &a, "B", &["read:db"]);
        let c = spawn(&registry, &a, "C", &["write:reports"]);
        let staged = registry
            .register(Registration::human("Stager", AgentKind::Tool, JUN, ["read:db"]).staged())
            .unwrap()
            .agent_id;
        registry.suspend(&b).unwrap();
        registry.terminate(&c, false).unwrap();

        let live: Vec<AgentId> = registry.list(false).unwrap().into_iter().map(|a| a.agent_id).collect();
        assert_eq!(live.len(), 3);
        assert!(live.contains(&a));
        assert!(live.contains(&b));
        assert!(live.contains(&staged));
        assert!(!live.contains(&c));

        let all = registry.list(true).unwrap();
        assert_eq!(all.len(), 4);
        // Newest first.
        assert_eq!(all[0].agent_id, staged);
    }
}
