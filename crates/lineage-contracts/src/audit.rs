//! Audit records: the immutable facts the trail is made of.
//!
//! One `AuditRecord` is written per logged action. Records are never
//! modified after they are appended.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{short_token, AgentId};

/// Unique identifier for a single audit record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(pub String);

impl LogId {
    pub fn random() -> Self {
        Self(format!("log_{}", short_token()))
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller-supplied part of an audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    pub agent_id: AgentId,
    /// What was attempted (e.g. "read:tickets").
    pub action: String,
    /// What it was attempted on, if anything (e.g. "ticket_12345").
    pub resource: Option<String>,
    pub success: bool,
    /// Opaque key-value payload. The core never inspects it.
    pub metadata: Option<serde_json::Value>,
}

impl ActionReport {
    /// A successful action with no resource and no metadata.
    pub fn new(agent_id: AgentId, action: impl Into<String>) -> Self {
        Self {
            agent_id,
            action: action.into(),
            resource: None,
            success: true,
            metadata: None,
        }
    }

    pub fn on(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// An immutable record that an agent performed (or attempted) an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub log_id: LogId,
    pub agent_id: AgentId,
    pub action: String,
    pub resource: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// The root human principal resolved through the delegation graph at
    /// write time. `None` when the chain is rooted in a policy agent.
    pub human_authority: Option<String>,
    pub success: bool,
    pub metadata: Option<serde_json::Value>,
}
