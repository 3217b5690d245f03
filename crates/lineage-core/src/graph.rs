//! Delegation Graph: parent→child spawn edges.
//!
//! Each child has at most one inbound edge, so the graph is a forest whose
//! roots are human- or policy-authorized agents. `ancestor_chain` is the one
//! algorithm that resolves an agent to its root; every human-authority lookup
//! in the workspace goes through it.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};

use lineage_contracts::{
    agent::{Agent, AgentId, AuthoritySource},
    delegation::{ChainLink, Delegation, DelegationId},
    error::{LineageError, LineageResult},
};

use crate::identity::IdentityStore;

/// Append-only set of delegation edges, indexed both ways.
#[derive(Debug, Default, Clone)]
pub struct DelegationGraph {
    /// Inbound edge for each child.
    by_child: HashMap<AgentId, Delegation>,
    /// Outbound children for each parent, in spawn order.
    children: HashMap<AgentId, Vec<AgentId>>,
}

impl DelegationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `parent_id` spawned `child_id`.
    ///
    /// Fails with `NotFound` if either agent is unknown, `DuplicateChild` if
    /// the child already has a parent, and `CycleDetected` if the child is
    /// the parent or one of its ancestors.
    pub fn record(
        &mut self,
        identities: &IdentityStore,
        delegation_id: DelegationId,
        parent_id: &AgentId,
        child_id: &AgentId,
        depth: u32,
        delegated_at: DateTime<Utc>,
    ) -> LineageResult<Delegation> {
        identities.get(parent_id)?;
        identities.get(child_id)?;

        if self.by_child.contains_key(child_id) {
            return Err(LineageError::DuplicateChild { child_id: child_id.0.clone() });
        }

        if child_id == parent_id || self.is_ancestor(child_id, parent_id) {
            return Err(LineageError::CycleDetected { agent_id: child_id.0.clone() });
        }

        let delegation = Delegation {
            delegation_id,
            parent_id: parent_id.clone(),
            child_id: child_id.clone(),
            delegated_at,
            depth,
        };
        self.insert_edge(delegation.clone())?;
        Ok(delegation)
    }

    /// Index an edge, checking only child uniqueness.
    ///
    /// Used by `record` and by snapshot restore, which validates the rest of
    /// the structure once all edges are loaded.
    pub(crate) fn insert_edge(&mut self, delegation: Delegation) -> LineageResult<()> {
        if self.by_child.contains_key(&delegation.child_id) {
            return Err(LineageError::DuplicateChild {
                child_id: delegation.child_id.0.clone(),
            });
        }
        self.children
            .entry(delegation.parent_id.clone())
            .or_default()
            .push(delegation.child_id.clone());
        self.by_child.insert(delegation.child_id.clone(), delegation);
        Ok(())
    }

    /// The inbound edge of `child_id`, if it was spawned.
    pub fn delegation_of(&self, child_id: &AgentId) -> Option<&Delegation> {
        self.by_child.get(child_id)
    }

    pub fn parent_of(&self, child_id: &AgentId) -> Option<&AgentId> {
        self.by_child.get(child_id).map(|d| &d.parent_id)
    }

    /// Direct children of `parent_id`, in spawn order.
    pub fn children_of(&self, parent_id: &AgentId) -> &[AgentId] {
        self.children.get(parent_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return true if `candidate` appears on the parent path above `agent_id`.
    ///
    /// Stops on a revisited node so a corrupted graph cannot loop forever.
    pub fn is_ancestor(&self, candidate: &AgentId, agent_id: &AgentId) -> bool {
        let mut seen = HashSet::new();
        let mut current = agent_id;
        while let Some(parent) = self.parent_of(current) {
            if parent == candidate {
                return true;
            }
            if !seen.insert(parent) {
                return false;
            }
            current = parent;
        }
        false
    }

    /// Walk parent edges from `agent_id` to its root, returned root first.
    ///
    /// The last element is always the queried agent; a root agent yields a
    /// chain of length 1. Terminated ancestors are walked past like any other.
    ///
    /// Fails with:
    /// - `NotFound` if `agent_id` is unknown
    /// - `DepthExceeded` if the root is not reached within `max_depth` hops,
    ///   or a delegated agent has no inbound edge (a broken chain)
    /// - `CycleDetected` if the walk revisits an agent
    pub fn ancestor_chain<'a>(
        &self,
        identities: &'a IdentityStore,
        agent_id: &AgentId,
        max_depth: u32,
    ) -> LineageResult<Vec<&'a Agent>> {
        let broken = || LineageError::DepthExceeded {
            agent_id: agent_id.0.clone(),
            max_depth,
        };

        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = identities.get(agent_id)?;

        loop {
            if !seen.insert(&current.agent_id) {
                return Err(LineageError::CycleDetected {
                    agent_id: current.agent_id.0.clone(),
                });
            }
            chain.push(current);

            if current.authority_source.is_root() {
                break;
            }

            // Taking another hop would make the chain longer than allowed.
            if chain.len() > max_depth as usize {
                return Err(broken());
            }

            let parent_id = self.parent_of(&current.agent_id).ok_or_else(broken)?;
            current = identities.get(parent_id).map_err(|_| LineageError::IntegrityViolation {
                reason: format!(
                    "delegation of '{}' names unknown parent '{}'",
                    current.agent_id, parent_id
                ),
            })?;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Every agent reachable through child edges from `agent_id`, breadth
    /// first. Does not include `agent_id` itself; each agent appears once.
    pub fn descendants(&self, agent_id: &AgentId) -> Vec<AgentId> {
        let mut found = Vec::new();
        let mut seen: HashSet<&AgentId> = HashSet::new();
        let mut queue: VecDeque<&AgentId> = VecDeque::from([agent_id]);
        seen.insert(agent_id);

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if seen.insert(child) {
                    found.push(child.clone());
                    queue.push_back(child);
                }
            }
        }
        found
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delegation> {
        self.by_child.values()
    }

    pub fn len(&self) -> usize {
        self.by_child.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_child.is_empty()
    }
}

/// The human principal behind a root-first chain.
///
/// `Some(created_by)` of the root when it is human-authorized, `None` when
/// the chain is rooted in a policy agent.
pub fn human_authority(chain: &[&Agent]) -> Option<String> {
    chain
        .first()
        .filter(|root| root.authority_source == AuthoritySource::Human)
        .map(|root| root.created_by.clone())
}

/// Render a root-first chain as links: the human principal (if any), then
/// each agent.
pub fn chain_links(chain: &[&Agent]) -> Vec<ChainLink> {
    let mut links = Vec::with_capacity(chain.len() + 1);
    if let Some(principal) = human_authority(chain) {
        links.push(ChainLink::human(principal));
    }
    links.extend(chain.iter().map(|a| ChainLink::agent(&a.agent_id, a.name.clone())));
    links
}
