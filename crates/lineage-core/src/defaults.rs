//! Default implementations of the environment seams.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use lineage_contracts::{agent::AgentId, audit::LogId, delegation::DelegationId};

use crate::traits::{Clock, IdSource, RegistryPolicy};

/// Default maximum number of delegation hops below a root.
pub const DEFAULT_MAX_DELEGATION_DEPTH: u32 = 8;

/// Principal prefixes recognized as human identifiers by `DefaultPolicy`.
pub const DEFAULT_HUMAN_PREFIXES: [&str; 2] = ["user:", "human:"];

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Wall-clock time clamped so that it never goes backwards.
///
/// If the system clock steps back, the last issued timestamp is repeated
/// until real time catches up.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        // A poisoned lock still holds a valid timestamp.
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let issued = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(issued);
        issued
    }
}

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Random, prefixed identifiers backed by v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn agent_id(&self) -> AgentId {
        AgentId::random()
    }

    fn delegation_id(&self) -> DelegationId {
        DelegationId::random()
    }

    fn log_id(&self) -> LogId {
        LogId::random()
    }
}

/// Deterministic identifiers (`agent_0000000000000001`, …) for reproducible
/// runs and tests. Each kind has its own counter.
///
/// The zero padding keeps lexical order equal to issue order.
#[derive(Debug, Default)]
pub struct SequentialIds {
    agents: AtomicU64,
    delegations: AtomicU64,
    logs: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next(counter: &AtomicU64, prefix: &str) -> String {
    let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{}_{:016}", prefix, n)
}

impl IdSource for SequentialIds {
    fn agent_id(&self) -> AgentId {
        AgentId(next(&self.agents, "agent"))
    }

    fn delegation_id(&self) -> DelegationId {
        DelegationId(next(&self.delegations, "del"))
    }

    fn log_id(&self) -> LogId {
        LogId(next(&self.logs, "log"))
    }
}

// ── Policy ────────────────────────────────────────────────────────────────────

/// Built-in policy: depth bound of 8, `user:`/`human:` principals required
/// for human authority, staged registration allowed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPolicy;

impl RegistryPolicy for DefaultPolicy {
    fn max_delegation_depth(&self) -> u32 {
        DEFAULT_MAX_DELEGATION_DEPTH
    }

    fn is_human_principal(&self, principal: &str) -> bool {
        DEFAULT_HUMAN_PREFIXES
            .iter()
            .any(|p| principal.len() > p.len() && principal.starts_with(p))
    }

    fn requires_human_principal(&self) -> bool {
        true
    }

    fn allows_staged_registration(&self) -> bool {
        true
    }
}
