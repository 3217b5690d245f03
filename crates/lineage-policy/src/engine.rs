//! TOML-driven registry policy.
//!
//! `TomlRegistryPolicy` loads a `PolicyConfig` from a TOML string or file and
//! implements the `RegistryPolicy` trait from lineage-core.

use std::path::Path;

use tracing::{debug, info};

use lineage_contracts::error::{LineageError, LineageResult};
use lineage_core::traits::RegistryPolicy;

use crate::config::PolicyConfig;

/// A `RegistryPolicy` read from a TOML document.
///
/// Construct via `from_toml_str` or `from_file`, then pass to the registry.
///
/// ```rust,ignore
/// use lineage_policy::engine::TomlRegistryPolicy;
///
/// let policy = TomlRegistryPolicy::from_file(Path::new("lineage.toml"))?;
/// let registry = Registry::new(Box::new(policy), clock, ids);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlRegistryPolicy {
    config: PolicyConfig,
}

impl TomlRegistryPolicy {
    /// Build a policy from an already-parsed config.
    ///
    /// Returns `LineageError::ConfigError` if the values are out of range.
    pub fn new(config: PolicyConfig) -> LineageResult<Self> {
        config.validate()?;
        debug!(
            max_delegation_depth = config.max_delegation_depth,
            prefixes = config.human_principal_prefixes.len(),
            "registry policy loaded"
        );
        Ok(Self { config })
    }

    /// Parse `s` as TOML and build a `TomlRegistryPolicy`.
    ///
    /// Returns `LineageError::ConfigError` if the TOML is malformed, has
    /// unknown keys, or holds out-of-range values.
    pub fn from_toml_str(s: &str) -> LineageResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| LineageError::ConfigError {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Self::new(config)
    }

    /// Read the file at `path` and parse it as TOML policy configuration.
    pub fn from_file(path: &Path) -> LineageResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LineageError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        let policy = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), "registry policy read from file");
        Ok(policy)
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl RegistryPolicy for TomlRegistryPolicy {
    fn max_delegation_depth(&self) -> u32 {
        self.config.max_delegation_depth
    }

    fn is_human_principal(&self, principal: &str) -> bool {
        self.config
            .human_principal_prefixes
            .iter()
            .any(|p| principal.len() > p.len() && principal.starts_with(p.as_str()))
    }

    fn requires_human_principal(&self) -> bool {
        self.config.require_human_principal
    }

    fn allows_staged_registration(&self) -> bool {
        self.config.allow_staged_registration
    }
}
