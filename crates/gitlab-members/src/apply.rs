//! Application of membership changes against GitLab.

use crate::access::AccessLevel;
use crate::client::MembershipApi;
use crate::error::Result;
use crate::reconcile::MemberChanges;
use crate::types::{DesiredMember, GroupId};
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of applying membership changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Members added.
    pub added: usize,
    /// Adds GitLab rejected because the user already was a member.
    pub conflicted: usize,
    /// Members whose access level or expiry was edited.
    pub updated: usize,
    /// Members removed.
    pub removed: usize,
    /// Owners that were left in place instead of being removed.
    pub skipped_owners: Vec<u64>,
}

impl ApplyReport {
    /// Number of calls that changed the group.
    pub fn total_changes(&self) -> usize {
        self.added + self.updated + self.removed
    }
}

/// Issues membership mutations for one group, one call at a time.
///
/// The first error other than an add conflict aborts the remaining calls;
/// whatever was already applied stays applied.
pub struct Applier<'a, A: MembershipApi + ?Sized> {
    api: &'a A,
    group: &'a GroupId,
    report: ApplyReport,
}

impl<'a, A: MembershipApi + ?Sized> Applier<'a, A> {
    /// Create an applier for the given group.
    pub fn new(api: &'a A, group: &'a GroupId) -> Self {
        Self {
            api,
            group,
            report: ApplyReport::default(),
        }
    }

    /// Add members. A user that is already a member counts as added.
    pub async fn add_members(&mut self, members: &[DesiredMember]) -> Result<()> {
        for member in members {
            debug!(user_id = member.user_id, group = %self.group, "Creating group member");

            match self.api.add_member(self.group, member).await {
                Ok(_) => self.report.added += 1,
                Err(e) if e.is_conflict() => {
                    debug!(user_id = member.user_id, "Got conflict, user is already a member");
                    self.report.conflicted += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Edit the access level and expiry of existing members.
    pub async fn update_members(&mut self, members: &[DesiredMember]) -> Result<()> {
        for member in members {
            debug!(user_id = member.user_id, group = %self.group, "Updating group member");

            self.api.edit_member(self.group, member).await?;
            self.report.updated += 1;
        }
        Ok(())
    }

    /// Remove members. Owners are never removed.
    pub async fn remove_members<I>(&mut self, members: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, AccessLevel)>,
    {
        for (user_id, access_level) in members {
            if access_level.is_owner() {
                warn!(user_id, group = %self.group, "Can't delete group member with \"owner\" access level");
                self.report.skipped_owners.push(user_id);
                continue;
            }

            debug!(user_id, group = %self.group, "Deleting group member");
            self.api.remove_member(self.group, user_id).await?;
            self.report.removed += 1;
        }
        Ok(())
    }

    /// Apply adds, then updates, then removals.
    pub async fn apply(mut self, changes: &MemberChanges) -> Result<ApplyReport> {
        self.add_members(&changes.to_add).await?;
        self.update_members(&changes.to_update).await?;
        self.remove_members(changes.to_remove.iter().map(|m| (m.user_id, m.access_level)))
            .await?;
        Ok(self.finish())
    }

    /// Report of the calls made so far.
    pub fn report(&self) -> &ApplyReport {
        &self.report
    }

    /// Consume the applier and return its report.
    pub fn finish(self) -> ApplyReport {
        self.report
    }
}
