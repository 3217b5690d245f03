//! Scenario 2: Attributed actions and forensic queries.
//!
//!   1. DataAnalyzer spawns ChartMaker with `create:charts`
//!   2. Both agents log actions; each record is attributed to the analyst
//!   3. The ChartMaker dossier shows its chain, scope, and records
//!   4. A query by human authority finds everything the analyst answers for
//!   5. The audit chain is verified and summary stats printed

use serde_json::json;

use lineage_audit::{AuditFilter, ForensicEngine};
use lineage_contracts::{audit::ActionReport, error::LineageResult};
use lineage_policy::TomlRegistryPolicy;

use super::{render_chain, World, ANALYST};

pub fn run_scenario(policy: &TomlRegistryPolicy) -> LineageResult<()> {
    println!("=== Scenario 2: Attribution and Forensics ===");
    println!();

    let world = World::new(policy)?;
    let charts = world.spawn(&world.analyzer, "ChartMaker", &["create:charts"])?;
    println!();

    // ── Log actions ───────────────────────────────────────────────────────────

    let reports = [
        ActionReport::new(world.analyzer.clone(), "read:db")
            .on("sales_q3")
            .with_metadata(json!({ "rows": 1200 })),
        ActionReport::new(charts.clone(), "create:charts").on("chart_1"),
        ActionReport::new(charts.clone(), "create:charts").on("chart_2").failed(),
    ];
    for report in reports {
        let record = world.trail.log(&world.registry, report)?;
        println!(
            "  Logged {} {:<14} {:<9} success={:<5} authority={}",
            record.log_id,
            record.action,
            record.resource.as_deref().unwrap_or("-"),
            record.success,
            record.human_authority.as_deref().unwrap_or("-")
        );
    }
    println!();

    // ── Trace ─────────────────────────────────────────────────────────────────

    let forensics = ForensicEngine::new(&world.registry, &world.trail);
    let dossier = forensics.trace(&charts)?;
    println!("  Dossier for {} ({})", dossier.agent.name, dossier.agent.agent_id);
    println!("    Chain:            {}", render_chain(&dossier.chain));
    println!("    State:            {}", dossier.state);
    println!("    Scope:            [{}]", dossier.scope.join(", "));
    println!(
        "    Human authority:  {}",
        dossier.human_authority.as_deref().unwrap_or("none (policy root)")
    );
    println!("    Audit records:    {}", dossier.audit_records.len());
    println!();

    // ── Query by human ────────────────────────────────────────────────────────

    let query = forensics.query(AuditFilter::new().human_authority(ANALYST))?;
    println!("  Actions attributable to {}: {}", ANALYST, query.iter().count());
    let failures = forensics.query(AuditFilter::new().human_authority(ANALYST).success(false))?;
    for record in failures.iter() {
        println!(
            "    FAILED: {} on {} by {}",
            record.action,
            record.resource.as_deref().unwrap_or("-"),
            record.agent_id
        );
    }
    println!();

    // ── Integrity and stats ───────────────────────────────────────────────────

    let integrity = world.trail.verify_integrity();
    let log = world.trail.export_log(world.registry.clock())?;
    println!(
        "  Audit chain integrity:  {} ({} event(s), terminal hash {})",
        if integrity.is_ok() { "VERIFIED" } else { "FAILED" },
        log.events.len(),
        &log.terminal_hash[..log.terminal_hash.len().min(16)]
    );

    let stats = forensics.stats()?;
    println!(
        "  Stats: {} agents ({} active), {} records, {} failed",
        stats.agents.total, stats.agents.active, stats.audit_records, stats.failed_actions
    );
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}
