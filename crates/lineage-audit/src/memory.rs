//! In-memory audit trail.
//!
//! `InMemoryAuditTrail` keeps every event in a `Vec` behind a `Mutex`, with
//! a `log_id` index for `get`. Events are shared as `Arc`s so that forensic
//! queries can take a cheap snapshot and release the lock immediately.
//!
//! Use `export_log()` to obtain a sealed `AuditLog`, and
//! `verify_integrity()` at any time to confirm the chain has not been
//! tampered with in memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info};

use lineage_contracts::{
    audit::{ActionReport, AuditRecord, LogId},
    error::{EntityKind, LineageError, LineageResult},
};
use lineage_core::{traits::Clock, Registry};

use crate::{
    chain::{find_break, hash_event},
    event::{AuditEvent, AuditLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct TrailState {
    /// All events written so far, in append order.
    pub(crate) events: Vec<Arc<AuditEvent>>,

    /// Position of each record in `events`.
    pub(crate) by_log_id: HashMap<LogId, usize>,

    /// The `this_hash` of the last event, or `GENESIS_HASH` before any
    /// event has been written.
    pub(crate) last_hash: String,
}

// ── Public trail ──────────────────────────────────────────────────────────────

/// An in-memory, append-only audit trail backed by a SHA-256 hash chain.
///
/// The trail holds no reference to the registry; each `log` call is handed
/// the registry it resolves authority against.
pub struct InMemoryAuditTrail {
    pub(crate) state: Mutex<TrailState>,
}

impl Default for InMemoryAuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrailState {
                events: Vec::new(),
                by_log_id: HashMap::new(),
                last_hash: AuditEvent::GENESIS_HASH.to_string(),
            }),
        }
    }

    fn lock(&self) -> LineageResult<MutexGuard<'_, TrailState>> {
        self.state.lock().map_err(|e| LineageError::StoreUnavailable {
            reason: format!("audit trail lock poisoned: {}", e),
        })
    }

    /// Record an action and return the stored record.
    ///
    /// `human_authority` is resolved fresh through the registry's ancestor
    /// chain and stored as a write-time snapshot. The agent may be in any
    /// lifecycle state, terminated included.
    ///
    /// Fails with `NotFound` for an unknown agent, or with the chain's
    /// integrity fault if it cannot be resolved. Nothing is appended on
    /// failure.
    pub fn log(&self, registry: &Registry, report: ActionReport) -> LineageResult<AuditRecord> {
        let human_authority = registry.human_authority(&report.agent_id)?;

        let mut state = self.lock()?;
        // Stamped under the trail lock so that chain order is time order.
        let record = AuditRecord {
            log_id: registry.ids().log_id(),
            agent_id: report.agent_id,
            action: report.action,
            resource: report.resource,
            timestamp: registry.clock().now(),
            human_authority,
            success: report.success,
            metadata: report.metadata,
        };

        if state.by_log_id.contains_key(&record.log_id) {
            return Err(LineageError::IntegrityViolation {
                reason: format!("log ID '{}' issued twice", record.log_id),
            });
        }

        let position = state.events.len();
        let sequence = position as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_event(sequence, &record, &prev_hash)?;

        state.by_log_id.insert(record.log_id.clone(), position);
        state.events.push(Arc::new(AuditEvent {
            sequence,
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        }));
        state.last_hash = this_hash;

        debug!(
            log_id = %record.log_id,
            agent_id = %record.agent_id,
            action = %record.action,
            human_authority = record.human_authority.as_deref().unwrap_or("-"),
            success = record.success,
            "action logged"
        );
        Ok(record)
    }

    /// Fetch a record by ID, failing with `NotFound`.
    pub fn get(&self, log_id: &LogId) -> LineageResult<AuditRecord> {
        let state = self.lock()?;
        state
            .by_log_id
            .get(log_id)
            .map(|&i| state.events[i].record.clone())
            .ok_or_else(|| LineageError::NotFound {
                entity: EntityKind::AuditRecord,
                id: log_id.0.clone(),
            })
    }

    /// A point-in-time copy of the chain, in append order.
    pub fn events(&self) -> LineageResult<Vec<Arc<AuditEvent>>> {
        Ok(self.lock()?.events.clone())
    }

    /// Verify that the in-memory chain has not been tampered with.
    ///
    /// Fails with `IntegrityViolation` naming the first broken event.
    pub fn verify_integrity(&self) -> LineageResult<()> {
        let state = self.lock()?;
        match find_break(&state.events) {
            None => Ok(()),
            Some(sequence) => {
                error!(sequence, "audit chain integrity check failed");
                Err(LineageError::IntegrityViolation {
                    reason: format!("audit chain broken at event {}", sequence),
                })
            }
        }
    }

    /// Export a sealed `AuditLog` containing every event written so far.
    pub fn export_log(&self, clock: &dyn Clock) -> LineageResult<AuditLog> {
        let state = self.lock()?;
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        info!(
            event_count = state.events.len(),
            terminal_hash = %terminal_hash,
            "audit log exported"
        );

        Ok(AuditLog {
            events: state.events.iter().map(|e| AuditEvent::clone(e)).collect(),
            exported_at: clock.now(),
            terminal_hash,
        })
    }

    pub fn len(&self) -> LineageResult<usize> {
        Ok(self.lock()?.events.len())
    }

    pub fn is_empty(&self) -> LineageResult<bool> {
        Ok(self.len()? == 0)
    }
}
