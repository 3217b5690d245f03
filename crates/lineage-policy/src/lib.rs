//! # lineage-policy
//!
//! TOML-driven deployment policy for the Lineage registry.
//!
//! ## Overview
//!
//! This crate provides [`TomlRegistryPolicy`], which implements the
//! [`RegistryPolicy`](lineage_core::traits::RegistryPolicy) trait. It sets
//! the delegation depth bound, which principals count as human, and whether
//! staged registration is allowed. Missing keys fall back to the built-in
//! defaults.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use lineage_policy::TomlRegistryPolicy;
//!
//! let policy = TomlRegistryPolicy::from_file(Path::new("lineage.toml"))?;
//! // Pass `Box::new(policy)` to `lineage_core::Registry::new(...)`.
//! ```

pub mod config;
pub mod engine;

pub use config::PolicyConfig;
pub use engine::TomlRegistryPolicy;

// ── Tests ─────────────────────────────────────────────────────────────────────
