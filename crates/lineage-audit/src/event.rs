//! Audit event and log types.
//!
//! `AuditEvent` is a single entry in the hash chain: it wraps an
//! `AuditRecord` with its position and the SHA-256 hashes that make
//! tampering detectable. `AuditLog` is the sealed export of the whole trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lineage_contracts::audit::AuditRecord;

/// A single entry in the audit hash chain.
///
/// Each event commits to the previous event via `prev_hash`. Modifying any
/// field of the embedded `record` invalidates `this_hash` and every later
/// `prev_hash`, which `verify_chain` detects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    /// The immutable record, including its write-time `human_authority`.
    pub record: AuditRecord,

    /// SHA-256 hash (hex) of the previous event, or `GENESIS_HASH` for the
    /// first event.
    pub prev_hash: String,

    /// SHA-256 hash (hex) over (sequence, prev_hash, canonical JSON of record).
    pub this_hash: String,
}

impl AuditEvent {
    /// The `prev_hash` of the first event: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A sealed copy of the trail at one point in time.
///
/// `terminal_hash` is the `this_hash` of the last event and commits to the
/// entire log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// All events in chain order (sequence 0 first).
    pub events: Vec<AuditEvent>,

    pub exported_at: DateTime<Utc>,

    /// Empty string if the log is empty.
    pub terminal_hash: String,
}
