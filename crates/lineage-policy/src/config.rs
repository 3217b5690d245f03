//! Registry policy configuration schema.
//!
//! Every key is optional; an empty document yields the built-in defaults.
//!
//! ```toml
//! max_delegation_depth = 4
//! human_principal_prefixes = ["user:", "sso:"]
//! require_human_principal = true
//! allow_staged_registration = false
//! ```

use serde::{Deserialize, Serialize};

use lineage_contracts::error::{LineageError, LineageResult};
use lineage_core::defaults::{DEFAULT_HUMAN_PREFIXES, DEFAULT_MAX_DELEGATION_DEPTH};

/// The top-level structure deserialized from a TOML policy file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Maximum number of delegation hops below a root. Must be at least 1.
    pub max_delegation_depth: u32,

    /// A principal is human if it starts with one of these and has
    /// something after it.
    pub human_principal_prefixes: Vec<String>,

    /// Reject human-authorized registrations whose `created_by` does not
    /// match a prefix.
    pub require_human_principal: bool,

    /// Allow registrations that start `provisioned`.
    pub allow_staged_registration: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            human_principal_prefixes: DEFAULT_HUMAN_PREFIXES.iter().map(|p| p.to_string()).collect(),
            require_human_principal: true,
            allow_staged_registration: true,
        }
    }
}

impl PolicyConfig {
    /// Check the values serde cannot.
    pub fn validate(&self) -> LineageResult<()> {
        if self.max_delegation_depth == 0 {
            return Err(LineageError::ConfigError {
                reason: "max_delegation_depth must be at least 1".to_string(),
            });
        }
        if self.human_principal_prefixes.is_empty() {
            return Err(LineageError::ConfigError {
                reason: "human_principal_prefixes must not be empty".to_string(),
            });
        }
        if let Some(bad) = self
            .human_principal_prefixes
            .iter()
            .find(|p| p.trim().is_empty() || p.chars().any(char::is_whitespace))
        {
            return Err(LineageError::ConfigError {
                reason: format!("invalid human principal prefix '{}'", bad),
            });
        }
        Ok(())
    }
}
