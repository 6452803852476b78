//! Desired versus observed membership diff.

use crate::types::{DesiredMember, ObservedMember};
use std::collections::HashMap;

/// Mutations needed to make a group's membership match its declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberChanges {
    /// Declared members missing from the group.
    pub to_add: Vec<DesiredMember>,
    /// Declared members whose access level or expiry differs.
    pub to_update: Vec<DesiredMember>,
    /// Group members that are not declared.
    pub to_remove: Vec<ObservedMember>,
}

impl MemberChanges {
    /// Whether no mutation is needed.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }

    /// Total number of mutations.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.to_remove.len()
    }
}

/// Whether an existing member differs from its declaration.
///
/// Access levels compare by permission, so `master` matches `maintainer`.
/// Expiry dates compare as strings; an expiry on only one side is a change.
pub fn member_differs(desired: &DesiredMember, observed: &ObservedMember) -> bool {
    !desired.access_level.is_equivalent(observed.access_level)
        || desired.expires_at != observed.expires_at
}

/// Diff the declared members against the members GitLab reports.
///
/// Every observed member matched by user id is claimed, changed or not.
/// Unclaimed observed members are returned for removal in observed order.
pub fn reconcile(desired: &[DesiredMember], observed: &[ObservedMember]) -> MemberChanges {
    let mut unclaimed: HashMap<u64, &ObservedMember> =
        observed.iter().map(|m| (m.user_id, m)).collect();
    let mut changes = MemberChanges::default();

    for member in desired {
        match unclaimed.remove(&member.user_id) {
            None => changes.to_add.push(member.clone()),
            Some(current) => {
                if member_differs(member, current) {
                    changes.to_update.push(member.clone());
                }
            }
        }
    }

    changes.to_remove = observed
        .iter()
        .filter(|m| unclaimed.contains_key(&m.user_id))
        .cloned()
        .collect();

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessLevel;

    #[test]
    fn test_identical_sets_need_no_changes() {
        let desired = vec![
            DesiredMember::new(1, AccessLevel::Owner),
            DesiredMember::new(2, AccessLevel::Guest).with_expires_at("2099-01-01"),
        ];
        let observed = vec![
            ObservedMember::new(2, AccessLevel::Guest).with_expires_at("2099-01-01"),
            ObservedMember::new(1, AccessLevel::Owner),
        ];

        let changes = reconcile(&desired, &observed);
        assert!(changes.is_empty());
        assert_eq!(changes.len(), 0);
    }

    #[test]
    fn test_add_and_remove() {
        let desired = vec![
            DesiredMember::new(1, AccessLevel::Owner),
            DesiredMember::new(2, AccessLevel::Developer),
        ];
        let observed = vec![
            ObservedMember::new(1, AccessLevel::Owner),
            ObservedMember::new(3, AccessLevel::Guest),
        ];

        let changes = reconcile(&desired, &observed);
        assert_eq!(changes.to_add, vec![DesiredMember::new(2, AccessLevel::Developer)]);
        assert!(changes.to_update.is_empty());
        assert_eq!(changes.to_remove, vec![ObservedMember::new(3, AccessLevel::Guest)]);
    }

    #[test]
    fn test_cleared_expiry_is_an_update() {
        let desired = vec![DesiredMember::new(1, AccessLevel::Owner)];
        let observed = vec![ObservedMember::new(1, AccessLevel::Owner).with_expires_at("2099-01-01")];

        let changes = reconcile(&desired, &observed);
        assert_eq!(changes.to_update, vec![DesiredMember::new(1, AccessLevel::Owner)]);
        assert!(changes.to_add.is_empty());
        assert!(changes.to_remove.is_empty());
    }

    #[test]
    fn test_new_expiry_and_level_change_are_updates() {
        let desired = vec![
            DesiredMember::new(1, AccessLevel::Guest).with_expires_at("2099-01-01"),
            DesiredMember::new(2, AccessLevel::Maintainer),
        ];
        let observed = vec![
            ObservedMember::new(1, AccessLevel::Guest),
            ObservedMember::new(2, AccessLevel::Developer),
        ];

        let changes = reconcile(&desired, &observed);
        assert_eq!(changes.to_update, desired);
    }

    #[test]
    fn test_expiry_compares_as_string() {
        let desired = vec![DesiredMember::new(1, AccessLevel::Guest).with_expires_at("2099-1-1")];
        let observed = vec![ObservedMember::new(1, AccessLevel::Guest).with_expires_at("2099-01-01")];

        assert_eq!(reconcile(&desired, &observed).to_update.len(), 1);
    }

    #[test]
    fn test_master_matches_maintainer() {
        let desired = vec![DesiredMember::new(4, AccessLevel::Master)];
        let observed = vec![ObservedMember::new(4, AccessLevel::Maintainer)];

        assert!(reconcile(&desired, &observed).is_empty());
        assert_eq!(desired[0].access_level.to_string(), "master");
    }

    #[test]
    fn test_remove_keeps_observed_order() {
        let observed = vec![
            ObservedMember::new(9, AccessLevel::Guest),
            ObservedMember::new(3, AccessLevel::Reporter),
            ObservedMember::new(5, AccessLevel::Developer),
        ];

        let changes = reconcile(&[], &observed);
        let ids: Vec<u64> = changes.to_remove.iter().map(|m| m.user_id).collect();
        assert_eq!(ids, vec![9, 3, 5]);
    }
}
