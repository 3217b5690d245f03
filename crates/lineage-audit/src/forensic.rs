//! Forensic Query Engine: read-only investigation over the audit trail and
//! the delegation graph.
//!
//! Queries run against a point-in-time snapshot of the trail, ordered by
//! `(timestamp, log_id)`. Filters are evaluated lazily while iterating, and
//! iterating the same query again yields the same sequence.
//!
//! Two authority views are available:
//!
//! - `query` matches and reports the `human_authority` stored at write time.
//! - `query_live` re-resolves each record's authority against the current
//!   graph and reports both, so a repaired graph can be compared against
//!   what was recorded.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use lineage_contracts::{
    agent::{Agent, AgentId, LifecycleState},
    audit::AuditRecord,
    delegation::ChainLink,
    error::{LineageError, LineageResult},
};
use lineage_core::{AgentCounts, Registry};

use crate::{event::AuditEvent, memory::InMemoryAuditTrail};

// ── Filters ───────────────────────────────────────────────────────────────────

/// AND-combined query filters. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditFilter {
    pub agent_id: Option<AgentId>,
    pub human_authority: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    /// Inclusive lower bound on `timestamp`.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub until: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    /// Stop after this many matches.
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(mut self, agent_id: &AgentId) -> Self {
        self.agent_id = Some(agent_id.clone());
        self
    }

    pub fn human_authority(mut self, principal: impl Into<String>) -> Self {
        self.human_authority = Some(principal.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Every filter except `human_authority`.
    fn matches_record(&self, record: &AuditRecord) -> bool {
        self.agent_id.as_ref().map_or(true, |id| &record.agent_id == id)
            && self.action.as_ref().map_or(true, |a| &record.action == a)
            && self
                .resource
                .as_ref()
                .map_or(true, |r| record.resource.as_ref() == Some(r))
            && self.since.map_or(true, |t| record.timestamp >= t)
            && self.until.map_or(true, |t| record.timestamp <= t)
            && self.success.map_or(true, |s| record.success == s)
    }

    fn matches_authority(&self, authority: Option<&str>) -> bool {
        self.human_authority
            .as_deref()
            .map_or(true, |wanted| authority == Some(wanted))
    }

    fn take_count(&self) -> usize {
        self.limit.unwrap_or(usize::MAX)
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Everything known about one agent, for an investigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dossier {
    pub agent: Agent,
    /// Root first; ends with `agent`.
    pub ancestor_chain: Vec<Agent>,
    /// The same chain rendered with the human principal in front.
    pub chain: Vec<ChainLink>,
    /// Depth of the agent's inbound delegation; `None` for roots.
    pub delegation_depth: Option<u32>,
    pub scope: Vec<String>,
    /// Intersection of every scope along the chain.
    pub effective_scope: Vec<String>,
    pub state: LifecycleState,
    /// Resolved from the current graph.
    pub human_authority: Option<String>,
    /// Ordered by `(timestamp, log_id)`.
    pub audit_records: Vec<AuditRecord>,
}

/// A record next to the authority the current graph assigns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub record: AuditRecord,
    pub live_authority: Option<String>,
    /// True when `live_authority` differs from the stored snapshot.
    pub drifted: bool,
}

/// Registry and trail totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicStats {
    pub agents: AgentCounts,
    pub audit_records: usize,
    pub failed_actions: usize,
    /// Distinct non-empty `human_authority` snapshots in the trail.
    pub human_authorities: usize,
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// A finite, restartable query over stored records.
pub struct AuditQuery {
    events: Vec<Arc<AuditEvent>>,
    filter: AuditFilter,
}

impl AuditQuery {
    /// Lazily yield matching records. Each call starts from the beginning.
    pub fn iter(&self) -> impl Iterator<Item = &AuditRecord> + '_ {
        self.events
            .iter()
            .map(|e| &e.record)
            .filter(|r| {
                self.filter.matches_record(r)
                    && self.filter.matches_authority(r.human_authority.as_deref())
            })
            .take(self.filter.take_count())
    }

    /// Collect the matching records.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.iter().cloned().collect()
    }

    pub fn filter(&self) -> &AuditFilter {
        &self.filter
    }
}

/// A finite, restartable query that re-resolves authority per record.
pub struct LiveQuery<'a> {
    registry: &'a Registry,
    events: Vec<Arc<AuditEvent>>,
    filter: AuditFilter,
}

impl<'a> LiveQuery<'a> {
    /// Lazily yield matching records with their live authority.
    ///
    /// The `human_authority` filter applies to the live value. A record
    /// whose chain can no longer be resolved yields its error in place.
    pub fn iter(&self) -> impl Iterator<Item = LineageResult<ResolvedRecord>> + '_ {
        self.events
            .iter()
            .map(|e| &e.record)
            .filter(|r| self.filter.matches_record(r))
            .filter_map(|r| match self.registry.human_authority(&r.agent_id) {
                Ok(live) if self.filter.matches_authority(live.as_deref()) => {
                    Some(Ok(ResolvedRecord {
                        drifted: live != r.human_authority,
                        live_authority: live,
                        record: r.clone(),
                    }))
                }
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .take(self.filter.take_count())
    }

    /// Collect every match, failing on the first unresolvable record.
    pub fn records(&self) -> LineageResult<Vec<ResolvedRecord>> {
        self.iter().collect()
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Read-only view over one registry and one trail.
pub struct ForensicEngine<'a> {
    registry: &'a Registry,
    trail: &'a InMemoryAuditTrail,
}

impl<'a> ForensicEngine<'a> {
    pub fn new(registry: &'a Registry, trail: &'a InMemoryAuditTrail) -> Self {
        Self { registry, trail }
    }

    /// The trail snapshot in `(timestamp, log_id)` order.
    fn ordered_events(&self) -> LineageResult<Vec<Arc<AuditEvent>>> {
        let mut events = self.trail.events()?;
        events.sort_by(|a, b| {
            a.record
                .timestamp
                .cmp(&b.record.timestamp)
                .then_with(|| a.record.log_id.cmp(&b.record.log_id))
        });
        Ok(events)
    }

    /// Full dossier for one agent. Fails with `NotFound` for an unknown
    /// agent, or with the chain's integrity fault.
    pub fn trace(&self, agent_id: &AgentId) -> LineageResult<Dossier> {
        // Chain, depth, and scope all come from a single registry read.
        let resolution = self.registry.resolve(agent_id)?;
        let audit_records = self.query(AuditFilter::new().agent(agent_id))?.records();

        // The chain always ends with the queried agent.
        let agent = resolution
            .chain
            .last()
            .cloned()
            .ok_or_else(|| LineageError::agent_not_found(agent_id.0.clone()))?;

        debug!(
            agent_id = %agent_id,
            chain_len = resolution.chain.len(),
            records = audit_records.len(),
            "dossier built"
        );

        Ok(Dossier {
            scope: agent.scope.to_vec(),
            state: agent.state,
            agent,
            ancestor_chain: resolution.chain,
            chain: resolution.links,
            delegation_depth: resolution.delegation_depth,
            effective_scope: resolution.effective_scope,
            human_authority: resolution.human_authority,
            audit_records,
        })
    }

    /// Stored records matching `filter`, by write-time authority.
    pub fn query(&self, filter: AuditFilter) -> LineageResult<AuditQuery> {
        Ok(AuditQuery { events: self.ordered_events()?, filter })
    }

    /// Stored records matching `filter`, with authority re-resolved against
    /// the registry's current graph.
    pub fn query_live(&self, filter: AuditFilter) -> LineageResult<LiveQuery<'a>> {
        Ok(LiveQuery {
            registry: self.registry,
            events: self.ordered_events()?,
            filter,
        })
    }

    pub fn stats(&self) -> LineageResult<ForensicStats> {
        let agents = self.registry.counts()?;
        let events = self.trail.events()?;

        let failed_actions = events.iter().filter(|e| !e.record.success).count();
        let human_authorities = events
            .iter()
            .filter_map(|e| e.record.human_authority.as_deref())
            .collect::<HashSet<_>>()
            .len();

        Ok(ForensicStats {
            agents,
            audit_records: events.len(),
            failed_actions,
            human_authorities,
        })
    }
}
