//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the record (serde_json, no pretty-printing)

use std::borrow::Borrow;

use sha2::{Digest, Sha256};

use lineage_contracts::{
    audit::AuditRecord,
    error::{LineageError, LineageResult},
};

use crate::event::AuditEvent;

/// Compute the SHA-256 hash for a single audit event.
///
/// Returns a lowercase 64-character hex string, or `IntegrityViolation` if
/// the record cannot be serialized.
pub fn hash_event(sequence: u64, record: &AuditRecord, prev_hash: &str) -> LineageResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| LineageError::IntegrityViolation {
        reason: format!("audit record '{}' is not serializable: {}", record.log_id, e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Return the sequence number of the first event that breaks the chain.
///
/// An event breaks the chain if its `sequence` is out of place, its
/// `prev_hash` does not equal the previous event's `this_hash` (or
/// `GENESIS_HASH` for the first), or its `this_hash` does not match the
/// value recomputed from its own fields.
pub fn find_break<E: Borrow<AuditEvent>>(events: &[E]) -> Option<u64> {
    let mut expected_prev: &str = AuditEvent::GENESIS_HASH;

    for (position, event) in events.iter().enumerate() {
        let event = event.borrow();
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return Some(event.sequence);
        }

        match hash_event(event.sequence, &event.record, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return Some(event.sequence),
        }

        expected_prev = event.this_hash.as_str();
    }

    None
}

/// Return true if the chain is intact. An empty chain is valid.
pub fn verify_chain<E: Borrow<AuditEvent>>(events: &[E]) -> bool {
    find_break(events).is_none()
}
