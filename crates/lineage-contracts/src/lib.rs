//! # lineage-contracts
//!
//! Shared types, scopes, and error contracts for the Lineage accountability
//! core.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, validated constructors, and the
//! lifecycle transition table.

pub mod agent;
pub mod audit;
pub mod delegation;
pub mod error;
pub mod scope;

#[cfg(test)]
mod tests {
    use super::*;
    use agent::{AgentId, AgentKind, AuthoritySource, LifecycleState};
    use audit::LogId;
    use delegation::{ChainLink, DelegationId};
    use error::LineageError;
    use scope::Scope;

    // ── Scope ────────────────────────────────────────────────────────────────

    #[test]
    fn scope_accepts_namespaced_entries() {
        let scope = Scope::new(["read:db", "write:reports"]).unwrap();
        assert_eq!(scope.len(), 2);
        assert!(scope.contains("read:db"));
        assert!(!scope.contains("create:charts"));
    }

    #[test]
    fn scope_rejects_empty_set() {
        let err = Scope::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, LineageError::InvalidScope { .. }));
    }

    #[test]
    fn scope_rejects_malformed_entries() {
        for bad in ["", "read", ":db", "read:", "read: db", "read:\tdb"] {
            let err = Scope::new([bad]).unwrap_err();
            assert!(
                matches!(err, LineageError::InvalidScope { .. }),
                "'{bad}' should be rejected"
            );
        }

        let too_long = format!("read:{}", "x".repeat(scope::MAX_ENTRY_LEN));
        assert!(Scope::new([too_long]).is_err());
    }

    #[test]
    fn scope_duplicates_collapse() {
        let scope = Scope::new(["read:db", "read:db"]).unwrap();
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn scope_subset_and_difference() {
        let parent = Scope::new(["read:db", "write:reports", "create:charts"]).unwrap();
        let child = Scope::new(["write:reports"]).unwrap();
        let wider = Scope::new(["write:reports", "delete:db", "admin:all"]).unwrap();

        assert!(child.is_subset_of(&parent));
        assert!(!wider.is_subset_of(&parent));
        // Sorted, so reports are stable.
        assert_eq!(
            wider.entries_missing_from(&parent),
            vec!["admin:all".to_string(), "delete:db".to_string()]
        );
    }

    #[test]
    fn scope_deserialization_is_validated() {
        let ok: Scope = serde_json::from_str(r#"["read:db","write:reports"]"#).unwrap();
        assert_eq!(ok.to_vec(), vec!["read:db", "write:reports"]);

        assert!(serde_json::from_str::<Scope>("[]").is_err());
        assert!(serde_json::from_str::<Scope>(r#"["nonsense"]"#).is_err());
    }

    // ── Lifecycle transitions ────────────────────────────────────────────────

    #[test]
    fn lifecycle_permitted_transitions() {
        use LifecycleState::*;
        assert!(Provisioned.can_transition_to(Active));
        assert!(Active.can_transition_to(Suspended));
        assert!(Active.can_transition_to(Terminated));
        assert!(Suspended.can_transition_to(Active));
        assert!(Suspended.can_transition_to(Terminated));
    }

    #[test]
    fn lifecycle_terminated_is_terminal() {
        use LifecycleState::*;
        for next in [Provisioned, Active, Suspended, Terminated] {
            assert!(!Terminated.can_transition_to(next));
        }
        assert!(Terminated.is_terminal());
    }

    #[test]
    fn lifecycle_rejects_skips_and_self_loops() {
        use LifecycleState::*;
        assert!(!Provisioned.can_transition_to(Suspended));
        assert!(!Active.can_transition_to(Active));
        assert!(!Suspended.can_transition_to(Suspended));
        assert!(!Active.can_transition_to(Provisioned));
    }

    // ── Serialized shapes ────────────────────────────────────────────────────

    #[test]
    fn enums_use_documented_wire_names() {
        assert_eq!(
            serde_json::to_string(&AgentKind::SemiAutonomous).unwrap(),
            r#""semi-autonomous""#
        );
        assert_eq!(
            serde_json::to_string(&AuthoritySource::Delegated).unwrap(),
            r#""delegated""#
        );
        assert_eq!(
            serde_json::to_string(&LifecycleState::Terminated).unwrap(),
            r#""terminated""#
        );
    }

    #[test]
    fn chain_link_serializes_type_field() {
        let human = serde_json::to_value(ChainLink::human("user:jun@example.org")).unwrap();
        assert_eq!(human["type"], "human");
        assert!(human.get("name").is_none());

        let agent = serde_json::to_value(ChainLink::agent(&AgentId::from("agent_a"), "A")).unwrap();
        assert_eq!(agent["type"], "agent");
        assert_eq!(agent["name"], "A");
    }

    // ── Identifiers ──────────────────────────────────────────────────────────

    #[test]
    fn random_ids_are_prefixed_and_unique() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| AgentId::random().0).collect();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.starts_with("agent_") && id.len() == 22));

        assert!(DelegationId::random().0.starts_with("del_"));
        assert!(LogId::random().0.starts_with("log_"));
    }

    // ── LineageError ─────────────────────────────────────────────────────────

    #[test]
    fn error_attenuation_lists_rejected_entries() {
        let err = LineageError::ScopeAttenuationViolation {
            rejected: vec!["create:charts".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("attenuation"));
        assert!(msg.contains("create:charts"));
    }

    #[test]
    fn error_not_found_display() {
        let msg = LineageError::agent_not_found("agent_missing").to_string();
        assert_eq!(msg, "agent 'agent_missing' not found");
    }

    #[test]
    fn error_integrity_faults_are_flagged() {
        assert!(LineageError::CycleDetected { agent_id: "a".into() }.is_integrity_fault());
        assert!(LineageError::DepthExceeded { agent_id: "a".into(), max_depth: 8 }
            .is_integrity_fault());
        assert!(!LineageError::DuplicateChild { child_id: "a".into() }.is_integrity_fault());
        assert!(!LineageError::InvalidScope { reason: "x".into() }.is_integrity_fault());
    }
}
