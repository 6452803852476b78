//! Lifecycle of a group members resource.
//!
//! A resource tracks one group. `create` adds the declared members,
//! `update` reconciles the declaration against a fresh listing, `delete`
//! removes the members recorded in state and `import` adopts an existing
//! group. Every write re-fetches the membership first; nothing is cached
//! between calls.

use crate::apply::{Applier, ApplyReport};
use crate::client::MembershipApi;
use crate::error::{MembersError, Result};
use crate::lister::list_group_members;
use crate::normalize::normalize;
use crate::reconcile::{reconcile, MemberChanges};
use crate::types::{
    DesiredMember, GroupId, GroupMembersConfig, GroupMembersState, MemberRecord, ObservedMember,
    ResourceStatus,
};
use tracing::{info, warn};

/// Changes a reconciliation would make, computed without mutating GitLab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Whether the resource must be created, or replaced because the group
    /// changed.
    pub action: PlanAction,
    /// Member mutations for an in-place update.
    pub changes: MemberChanges,
}

/// What `apply` will do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// Nothing to do.
    NoOp,
    /// Add every declared member.
    Create,
    /// Reconcile members in place.
    Update,
    /// The declared group differs from the tracked one: delete, then create.
    Replace,
}

/// Manages the membership of GitLab groups through an explicit API client.
pub struct GroupMembersResource<A> {
    api: A,
}

impl<A: MembershipApi> GroupMembersResource<A> {
    /// Create a resource manager using the given client.
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// The underlying client.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Add every declared member to the group and start tracking it.
    ///
    /// Users that already are members are left as they are.
    pub async fn create(
        &self,
        config: &GroupMembersConfig,
    ) -> Result<(GroupMembersState, ApplyReport)> {
        let desired = normalize(&config.members)?;
        info!(group = %config.group_id, members = desired.len(), "Creating group members");

        let mut applier = Applier::new(&self.api, &config.group_id);
        applier.add_members(&desired).await?;
        let report = applier.finish();

        let mut state = GroupMembersState::tracking(config.group_id.clone());
        let observed = self.refresh(&mut state).await?;
        state.status = status_for(&desired, &observed);

        Ok((state, report))
    }

    /// Refresh the state from GitLab.
    ///
    /// If the group no longer exists the state is emptied and
    /// [`MembersError::GroupGone`] is returned.
    pub async fn read(&self, state: &mut GroupMembersState) -> Result<()> {
        self.refresh(state).await.map(|_| ())
    }

    /// Compute what `apply` would do for the declaration.
    ///
    /// The state is refreshed and its status set to `Synced` or `Drifted`.
    pub async fn plan(
        &self,
        config: &GroupMembersConfig,
        state: &mut GroupMembersState,
    ) -> Result<Plan> {
        let desired = normalize(&config.members)?;

        if !state.exists() {
            return Ok(Plan {
                action: PlanAction::Create,
                changes: MemberChanges {
                    to_add: desired,
                    ..MemberChanges::default()
                },
            });
        }

        if state.group_id.as_ref() != Some(&config.group_id) {
            return Ok(Plan {
                action: PlanAction::Replace,
                changes: MemberChanges {
                    to_add: desired,
                    ..MemberChanges::default()
                },
            });
        }

        let observed = match self.refresh(state).await {
            Ok(observed) => observed,
            Err(MembersError::GroupGone(group)) => {
                warn!(group = %group, "Group vanished, it will be created again");
                return Ok(Plan {
                    action: PlanAction::Create,
                    changes: MemberChanges {
                        to_add: desired,
                        ..MemberChanges::default()
                    },
                });
            }
            Err(e) => return Err(e),
        };

        let changes = reconcile(&desired, &observed);
        state.status = if changes.is_empty() {
            ResourceStatus::Synced
        } else {
            ResourceStatus::Drifted
        };

        let action = if changes.is_empty() {
            PlanAction::NoOp
        } else {
            PlanAction::Update
        };
        Ok(Plan { action, changes })
    }

    /// Reconcile the group's members against the declaration: add missing
    /// members, update changed ones, remove undeclared ones.
    ///
    /// The declaration must name the tracked group; a different group needs
    /// [`apply`](Self::apply), which replaces the resource.
    pub async fn update(
        &self,
        config: &GroupMembersConfig,
        state: &mut GroupMembersState,
    ) -> Result<ApplyReport> {
        let group = match &state.group_id {
            Some(tracked) if *tracked == config.group_id => tracked.clone(),
            tracked => {
                return Err(MembersError::InvalidConfig(format!(
                    "declared group {} is not the tracked group {}",
                    config.group_id,
                    tracked.as_ref().map_or_else(|| "(none)".to_string(), ToString::to_string),
                )))
            }
        };

        let desired = normalize(&config.members)?;
        let observed = self.refresh(state).await?;

        let changes = reconcile(&desired, &observed);
        info!(
            group = %group,
            add = changes.to_add.len(),
            update = changes.to_update.len(),
            remove = changes.to_remove.len(),
            "Updating group members"
        );

        let report = Applier::new(&self.api, &group)
            .apply(&changes)
            .await?;

        let observed = self.refresh(state).await?;
        state.status = status_for(&desired, &observed);
        Ok(report)
    }

    /// Remove the members recorded in state, except owners, and stop
    /// tracking the group.
    pub async fn delete(&self, state: &mut GroupMembersState) -> Result<ApplyReport> {
        let Some(group) = state.group_id.clone() else {
            state.id = None;
            state.status = ResourceStatus::Deleted;
            return Ok(ApplyReport::default());
        };
        info!(group = %group, members = state.members.len(), "Deleting group members");

        let mut applier = Applier::new(&self.api, &group);
        applier
            .remove_members(state.members.iter().map(|m| (m.id, m.access_level)))
            .await?;

        state.id = None;
        state.members.clear();
        state.status = ResourceStatus::Deleted;
        Ok(applier.finish())
    }

    /// Start tracking an existing group and read its members.
    ///
    /// The state stays `Created` until a declaration is planned or applied
    /// against it.
    pub async fn import(&self, group_id: GroupId) -> Result<GroupMembersState> {
        info!(group = %group_id, "Importing group members");

        let mut state = GroupMembersState::tracking(group_id);
        self.refresh(&mut state).await?;
        Ok(state)
    }

    /// Bring the group in line with the declaration, creating, updating or
    /// replacing the resource as needed.
    pub async fn apply(
        &self,
        config: &GroupMembersConfig,
        state: &mut GroupMembersState,
    ) -> Result<ApplyReport> {
        if state.exists() && state.group_id.as_ref() != Some(&config.group_id) {
            info!(
                from = ?state.group_id,
                to = %config.group_id,
                "Group changed, replacing resource"
            );
            self.delete(state).await?;
        }

        if state.exists() {
            match self.update(config, state).await {
                Err(MembersError::GroupGone(group)) => {
                    warn!(group = %group, "Group vanished, creating members again");
                }
                result => return result,
            }
        }

        let (created, report) = self.create(config).await?;
        *state = created;
        Ok(report)
    }

    /// List the tracked group and store the result in the state.
    async fn refresh(&self, state: &mut GroupMembersState) -> Result<Vec<ObservedMember>> {
        match list_group_members(&self.api, &mut state.id).await {
            Ok(observed) => {
                state.members = observed.iter().map(MemberRecord::from).collect();
                state.group_id = state.id.clone();
                Ok(observed)
            }
            Err(e @ MembersError::GroupGone(_)) => {
                state.members.clear();
                state.status = ResourceStatus::Absent;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

fn status_for(desired: &[DesiredMember], observed: &[ObservedMember]) -> ResourceStatus {
    if reconcile(desired, observed).is_empty() {
        ResourceStatus::Synced
    } else {
        ResourceStatus::Drifted
    }
}
