//! # lineage-audit
//!
//! Append-only, SHA-256 hash-chained audit trail and forensic queries for
//! the Lineage registry.
//!
//! ## Overview
//!
//! Every logged action is attributed to the human at the root of the acting
//! agent's delegation chain, resolved when the action is written. The record
//! is wrapped in an `AuditEvent` that links to the previous event via its
//! SHA-256 hash, so any edit to a stored record is detected by
//! `verify_chain`.
//!
//! The `ForensicEngine` reads the trail and the registry together: agent
//! dossiers, filtered queries, and a live mode that compares stored
//! attribution with what the current graph says.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lineage_audit::{AuditFilter, ForensicEngine, InMemoryAuditTrail};
//! use lineage_contracts::audit::ActionReport;
//!
//! let trail = InMemoryAuditTrail::new();
//! let record = trail.log(&registry, ActionReport::new(agent_id, "create:charts").on("chart_1"))?;
//!
//! let forensics = ForensicEngine::new(&registry, &trail);
//! let dossier = forensics.trace(&record.agent_id)?;
//! let jun = forensics.query(AuditFilter::new().human_authority("user:jun@example.org"))?;
//! ```

pub mod chain;
pub mod event;
pub mod forensic;
pub mod memory;

pub use chain::{find_break, hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use forensic::{
    AuditFilter, AuditQuery, Dossier, ForensicEngine, ForensicStats, LiveQuery, ResolvedRecord,
};
pub use memory::InMemoryAuditTrail;

// ── Tests ─────────────────────────────────────────────────────────────────────
