//! Demo scenarios. Each builds its own registry and trail from the shared
//! policy, so they can run in any order.

pub mod cascade;
pub mod delegation;
pub mod forensics;

use lineage_audit::InMemoryAuditTrail;
use lineage_contracts::{
    agent::{AgentId, AgentKind},
    delegation::{ChainLink, ChainLinkKind},
    error::LineageResult,
};
use lineage_core::{MonotonicClock, RandomIds, Registration, Registry, SpawnRequest};
use lineage_policy::TomlRegistryPolicy;

/// The human every scenario's root agent acts for.
pub const ANALYST: &str = "user:jun@example.org";

/// A registry, a trail, and the root DataAnalyzer agent.
pub struct World {
    pub registry: Registry,
    pub trail: InMemoryAuditTrail,
    pub analyzer: AgentId,
}

impl World {
    pub fn new(policy: &TomlRegistryPolicy) -> LineageResult<Self> {
        let registry = Registry::new(
            Box::new(policy.clone()),
            Box::new(MonotonicClock::new()),
            Box::new(RandomIds),
        );
        let analyzer = registry.register(Registration::human(
            "DataAnalyzer",
            AgentKind::Autonomous,
            ANALYST,
            ["read:db", "write:reports", "create:charts"],
        ))?;
        println!(
            "  Registered {} ({}) for {} with scope [{}]",
            analyzer.name,
            analyzer.agent_id,
            ANALYST,
            analyzer.scope.to_vec().join(", ")
        );

        Ok(Self {
            registry,
            trail: InMemoryAuditTrail::new(),
            analyzer: analyzer.agent_id,
        })
    }

    /// Spawn a tool agent and print where it landed.
    pub fn spawn(&self, parent: &AgentId, name: &str, scope: &[&str]) -> LineageResult<AgentId> {
        let outcome = self
            .registry
            .spawn(parent, SpawnRequest::new(name, AgentKind::Tool, scope.iter().copied()))?;
        println!(
            "  Spawned {} ({}) at depth {}: {}",
            name,
            outcome.agent.agent_id,
            outcome.delegation.depth,
            render_chain(&outcome.delegation_chain)
        );
        Ok(outcome.agent.agent_id)
    }
}

/// `user:jun@example.org (human) -> DataAnalyzer -> ChartMaker`
pub fn render_chain(links: &[ChainLink]) -> String {
    links
        .iter()
        .map(|link| match link.kind {
            ChainLinkKind::Human => format!("{} (human)", link.id),
            ChainLinkKind::Agent => link.name.clone().unwrap_or_else(|| link.id.clone()),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}
