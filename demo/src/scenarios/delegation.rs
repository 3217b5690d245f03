//! Scenario 1: Delegation and scope attenuation.
//!
//!   1. DataAnalyzer is registered for a human with three permissions
//!   2. It spawns ReportGenerator with `write:reports` only → depth 0
//!   3. ReportGenerator tries to spawn a child with `create:charts`, which it
//!      does not hold → rejected, nothing created
//!   4. Scope checks show what each agent may do

use lineage_contracts::{
    agent::AgentKind,
    error::{LineageError, LineageResult},
};
use lineage_core::SpawnRequest;
use lineage_policy::TomlRegistryPolicy;

use super::World;

pub fn run_scenario(policy: &TomlRegistryPolicy) -> LineageResult<()> {
    println!("=== Scenario 1: Delegation and Scope Attenuation ===");
    println!();

    let world = World::new(policy)?;
    let reporter = world.spawn(&world.analyzer, "ReportGenerator", &["write:reports"])?;
    println!();

    // ── Attempt to widen scope ────────────────────────────────────────────────

    let before = world.registry.counts()?;
    match world.registry.spawn(
        &reporter,
        SpawnRequest::new("ChartMaker", AgentKind::Tool, ["create:charts"]),
    ) {
        Err(LineageError::ScopeAttenuationViolation { rejected }) => {
            println!("  ReportGenerator -> ChartMaker [create:charts]");
            println!("  Spawn rejected:         scope exceeds parent");
            println!("  Offending entries:      {}", rejected.join(", "));
        }
        Err(e) => return Err(e),
        Ok(outcome) => {
            println!("  UNEXPECTED: spawn succeeded ({})", outcome.agent.agent_id);
        }
    }
    let after = world.registry.counts()?;
    println!(
        "  Registry unchanged:     {} ({} agents, {} delegations)",
        if before == after { "YES" } else { "NO" },
        after.total,
        after.delegations
    );
    println!();

    // ── Scope checks ──────────────────────────────────────────────────────────

    for (id, action) in [
        (&world.analyzer, "create:charts"),
        (&reporter, "write:reports"),
        (&reporter, "read:db"),
    ] {
        let check = world.registry.check_scope(id, action)?;
        println!(
            "  check_scope({}, {:<14}) → {}",
            world.registry.get(id)?.name,
            action,
            if check.allowed { "ALLOWED" } else { "DENIED" }
        );
    }

    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}
