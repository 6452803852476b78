//! Property-based tests for membership reconciliation.

use gitlab_members::{reconcile, AccessLevel, DesiredMember, MemberChanges, ObservedMember};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

/// Any declarable access level, including the deprecated alias.
fn declared_level() -> impl Strategy<Value = AccessLevel> {
    prop_oneof![
        Just(AccessLevel::Guest),
        Just(AccessLevel::Reporter),
        Just(AccessLevel::Developer),
        Just(AccessLevel::Master),
        Just(AccessLevel::Maintainer),
        Just(AccessLevel::Owner),
    ]
}

/// Levels as GitLab reports them.
fn observed_level() -> impl Strategy<Value = AccessLevel> {
    prop_oneof![
        Just(AccessLevel::Guest),
        Just(AccessLevel::Reporter),
        Just(AccessLevel::Developer),
        Just(AccessLevel::Maintainer),
        Just(AccessLevel::Owner),
    ]
}

fn expiry() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("2099-01-01".to_string())),
        Just(Some("2030-06-15".to_string())),
    ]
}

fn desired_set() -> impl Strategy<Value = Vec<DesiredMember>> {
    prop::collection::btree_map(1u64..40, (declared_level(), expiry()), 0..20).prop_map(
        |members: BTreeMap<u64, (AccessLevel, Option<String>)>| {
            members
                .into_iter()
                .map(|(user_id, (access_level, expires_at))| DesiredMember {
                    user_id,
                    access_level,
                    expires_at,
                })
                .collect()
        },
    )
}

fn observed_set() -> impl Strategy<Value = Vec<ObservedMember>> {
    prop::collection::btree_map(1u64..40, (observed_level(), expiry()), 0..20).prop_map(
        |members: BTreeMap<u64, (AccessLevel, Option<String>)>| {
            members
                .into_iter()
                .map(|(user_id, (access_level, expires_at))| ObservedMember {
                    expires_at,
                    ..ObservedMember::new(user_id, access_level)
                })
                .collect()
        },
    )
}

/// What GitLab would report for a member written from a declaration.
fn as_observed(member: &DesiredMember) -> ObservedMember {
    ObservedMember {
        expires_at: member.expires_at.clone(),
        ..ObservedMember::new(
            member.user_id,
            AccessLevel::from_value(member.access_level.value()).unwrap(),
        )
    }
}

/// Apply the changes to an observed set, the way GitLab would.
fn simulate(observed: &[ObservedMember], changes: &MemberChanges) -> Vec<ObservedMember> {
    let removed: HashSet<u64> = changes.to_remove.iter().map(|m| m.user_id).collect();
    let mut after: Vec<ObservedMember> = observed
        .iter()
        .filter(|m| !removed.contains(&m.user_id))
        .map(|m| {
            changes
                .to_update
                .iter()
                .find(|u| u.user_id == m.user_id)
                .map(as_observed)
                .unwrap_or_else(|| m.clone())
        })
        .collect();
    after.extend(changes.to_add.iter().map(as_observed));
    after
}

fn ids<'a>(ids: impl IntoIterator<Item = &'a u64>) -> HashSet<u64> {
    ids.into_iter().copied().collect()
}

proptest! {
    /// Property: a group that already matches its declaration needs no changes
    #[test]
    fn prop_matching_sets_need_no_changes(desired in desired_set()) {
        let observed: Vec<ObservedMember> = desired.iter().rev().map(as_observed).collect();
        prop_assert!(reconcile(&desired, &observed).is_empty());
    }

    /// Property: declared-only users are added, undeclared users are removed
    #[test]
    fn prop_one_sided_users(desired in desired_set(), observed in observed_set()) {
        let changes = reconcile(&desired, &observed);

        let desired_ids = ids(desired.iter().map(|m| &m.user_id));
        let observed_ids = ids(observed.iter().map(|m| &m.user_id));
        let added = ids(changes.to_add.iter().map(|m| &m.user_id));
        let updated = ids(changes.to_update.iter().map(|m| &m.user_id));
        let removed = ids(changes.to_remove.iter().map(|m| &m.user_id));

        let desired_only: HashSet<u64> = desired_ids.difference(&observed_ids).copied().collect();
        let observed_only: HashSet<u64> = observed_ids.difference(&desired_ids).copied().collect();

        prop_assert_eq!(&added, &desired_only);
        prop_assert_eq!(&removed, &observed_only);
        prop_assert!(updated.is_subset(&desired_ids.intersection(&observed_ids).copied().collect()));
        prop_assert!(added.is_disjoint(&updated));
        prop_assert!(removed.is_disjoint(&updated));
    }

    /// Property: reconciling again after applying the changes is a no-op
    #[test]
    fn prop_reconcile_is_idempotent(desired in desired_set(), observed in observed_set()) {
        let changes = reconcile(&desired, &observed);
        let after = simulate(&observed, &changes);

        let again = reconcile(&desired, &after);
        prop_assert!(again.is_empty(), "second pass produced {:?}", again);
    }

    /// Property: updates carry the declared values verbatim
    #[test]
    fn prop_updates_keep_declared_values(desired in desired_set(), observed in observed_set()) {
        let changes = reconcile(&desired, &observed);
        for update in &changes.to_update {
            prop_assert!(desired.contains(update));
        }
        for add in &changes.to_add {
            prop_assert!(desired.contains(add));
        }
    }
}
