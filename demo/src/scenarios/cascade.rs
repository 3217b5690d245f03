//! Scenario 3: Cascade termination.
//!
//!   1. DataAnalyzer spawns ReportGenerator and ChartMaker
//!   2. ReportGenerator logs a report
//!   3. DataAnalyzer is terminated with cascade → all three terminated
//!   4. ReportGenerator's earlier record is still returned, unaltered

use lineage_audit::{AuditFilter, ForensicEngine};
use lineage_contracts::{audit::ActionReport, error::LineageResult};
use lineage_policy::TomlRegistryPolicy;

use super::World;

pub fn run_scenario(policy: &TomlRegistryPolicy) -> LineageResult<()> {
    println!("=== Scenario 3: Cascade Termination ===");
    println!();

    let world = World::new(policy)?;
    let reporter = world.spawn(&world.analyzer, "ReportGenerator", &["write:reports"])?;
    let charts = world.spawn(&world.analyzer, "ChartMaker", &["create:charts"])?;

    world.trail.log(
        &world.registry,
        ActionReport::new(reporter.clone(), "write:reports").on("q3_summary.pdf"),
    )?;

    let forensics = ForensicEngine::new(&world.registry, &world.trail);
    let before = forensics.query(AuditFilter::new().agent(&reporter))?.records();
    println!();

    // ── Terminate the root ────────────────────────────────────────────────────

    let report = world.registry.terminate(&world.analyzer, true)?;
    println!("  terminate(DataAnalyzer, cascade=true) → {} agent(s)", report.count());
    for id in [&world.analyzer, &reporter, &charts] {
        let agent = world.registry.get(id)?;
        println!("    {:<16} {}", agent.name, agent.state);
    }
    println!();

    // ── Records survive ───────────────────────────────────────────────────────

    let after = forensics.query(AuditFilter::new().agent(&reporter))?.records();
    println!(
        "  ReportGenerator records after termination: {} ({})",
        after.len(),
        if after == before { "unaltered" } else { "CHANGED" }
    );
    println!(
        "  Audit chain integrity:  {}",
        if world.trail.verify_integrity().is_ok() { "VERIFIED" } else { "FAILED" }
    );

    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}
