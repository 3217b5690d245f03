//! # lineage-core
//!
//! The accountability core for agents that spawn agents.
//!
//! This crate provides:
//! - The Identity Store, Delegation Graph, Scope Authority, and Lifecycle
//!   Manager as plain, single-threaded building blocks
//! - The `Registry` that composes them behind one lock and makes register,
//!   spawn, and (cascade) terminate atomic
//! - The environment seams (`Clock`, `IdSource`, `RegistryPolicy`) and their
//!   defaults
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lineage_core::{Registry, Registration, SpawnRequest};
//! use lineage_contracts::agent::AgentKind;
//!
//! let registry = Registry::default();
//! let analyst = registry.register(Registration::human(
//!     "DataAnalyzer", AgentKind::Autonomous, "user:jun@example.org",
//!     ["read:db", "write:reports"],
//! ))?;
//! let child = registry.spawn(
//!     &analyst.agent_id,
//!     SpawnRequest::new("ReportGenerator", AgentKind::Tool, ["write:reports"]),
//! )?;
//! ```

pub mod defaults;
pub mod graph;
pub mod identity;
pub mod lifecycle;
pub mod registry;
pub mod scope;
pub mod snapshot;
pub mod traits;

pub use defaults::{DefaultPolicy, MonotonicClock, RandomIds, SequentialIds};
pub use identity::Registration;
pub use lifecycle::TerminationReport;
pub use registry::{AgentCounts, Registry, Resolution, SpawnOutcome, SpawnRequest};
pub use scope::ScopeCheck;
pub use snapshot::RegistrySnapshot;
