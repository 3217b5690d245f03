//! Lineage demo CLI
//!
//! Runs one or all of the three accountability scenarios. Each scenario uses
//! the real registry, policy, audit trail, and forensic engine.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- delegation
//!   cargo run -p demo -- forensics
//!   cargo run -p demo -- cascade --policy lineage.toml

mod scenarios;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lineage_contracts::error::LineageResult;
use lineage_policy::TomlRegistryPolicy;

use scenarios::{cascade, delegation, forensics};

/// Policy used when `--policy` is not given.
const DEFAULT_POLICY: &str = include_str!("../policies/default.toml");

// ── CLI definition ────────────────────────────────────────────────────────────

/// Lineage: accountability for agents that spawn agents.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Lineage accountability core demo",
    long_about = "Runs Lineage demo scenarios showing delegation with scope attenuation,\n\
                  human attribution of agent actions, forensic queries, and cascade termination."
)]
struct Cli {
    /// Registry policy TOML file (defaults to the bundled policy).
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: spawn with narrowed scope, reject a widened one.
    Delegation,
    /// Scenario 2: attributed actions, dossier, and queries.
    Forensics,
    /// Scenario 3: cascade termination keeps audit records intact.
    Cascade,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = load_policy(cli.policy.as_ref()).and_then(|policy| match cli.command {
        Command::RunAll => run_all(&policy),
        Command::Delegation => delegation::run_scenario(&policy),
        Command::Forensics => forensics::run_scenario(&policy),
        Command::Cascade => cascade::run_scenario(&policy),
    });

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_policy(path: Option<&PathBuf>) -> LineageResult<TomlRegistryPolicy> {
    match path {
        Some(path) => TomlRegistryPolicy::from_file(path),
        None => {
            info!("using bundled registry policy");
            TomlRegistryPolicy::from_toml_str(DEFAULT_POLICY)
        }
    }
}

fn run_all(policy: &TomlRegistryPolicy) -> LineageResult<()> {
    delegation::run_scenario(policy)?;
    forensics::run_scenario(policy)?;
    cascade::run_scenario(policy)?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Lineage: Agent Accountability Core");
    println!("===================================");
    println!();
    println!("For every recorded action:");
    println!("  [1] Which agent performed it       (identity store)");
    println!("  [2] What scope authorized it       (delegation graph + scope attenuation)");
    println!("  [3] Which human is accountable     (ancestor chain to the root)");
    println!();
}
