//! Permission scope types.
//!
//! A `Scope` is the set of permission strings an agent may exercise. Scopes
//! are validated on construction and immutable afterwards: a delegated agent
//! can only ever hold a subset of its parent's scope.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{LineageError, LineageResult};

/// Longest permission string accepted, in bytes.
pub const MAX_ENTRY_LEN: usize = 128;

/// A validated, non-empty set of `namespace:name` permission strings.
///
/// Entries are kept in sorted order so that serialized scopes and attenuation
/// reports are stable. Deserialization goes through the same validation as
/// `Scope::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Scope {
    inner: BTreeSet<String>,
}

impl Scope {
    /// Build a scope from any collection of string-like entries.
    ///
    /// Returns `LineageError::InvalidScope` if the collection is empty or any
    /// entry is malformed. Duplicate entries collapse silently.
    pub fn new<I, S>(entries: I) -> LineageResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = BTreeSet::new();
        for entry in entries {
            let entry = entry.into();
            validate_entry(&entry)?;
            inner.insert(entry);
        }

        if inner.is_empty() {
            return Err(LineageError::InvalidScope {
                reason: "scope must contain at least one permission".to_string(),
            });
        }

        Ok(Self { inner })
    }

    /// Return true if the scope grants `permission` exactly.
    pub fn contains(&self, permission: &str) -> bool {
        self.inner.contains(permission)
    }

    /// Return true if every entry of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &Scope) -> bool {
        self.inner.is_subset(&other.inner)
    }

    /// Entries of `self` that `other` does not grant, in sorted order.
    pub fn entries_missing_from(&self, other: &Scope) -> Vec<String> {
        self.inner.difference(&other.inner).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always false for a constructed scope; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.inner.iter().cloned().collect()
    }
}

impl TryFrom<Vec<String>> for Scope {
    type Error = LineageError;

    fn try_from(entries: Vec<String>) -> LineageResult<Self> {
        Scope::new(entries)
    }
}

impl From<Scope> for Vec<String> {
    fn from(scope: Scope) -> Self {
        scope.inner.into_iter().collect()
    }
}

/// Check one permission string against the `namespace:name` format.
fn validate_entry(entry: &str) -> LineageResult<()> {
    let malformed = |why: &str| LineageError::InvalidScope {
        reason: format!("malformed permission '{}': {}", entry, why),
    };

    if entry.is_empty() {
        return Err(malformed("empty entry"));
    }
    if entry.len() > MAX_ENTRY_LEN {
        return Err(malformed("entry too long"));
    }
    if entry.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(malformed("whitespace or control characters"));
    }

    match entry.split_once(':') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(malformed("expected 'namespace:name'")),
    }
}
