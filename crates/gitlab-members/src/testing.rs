//! In-memory GitLab used by unit tests.

use crate::access::AccessLevel;
use crate::client::{MemberPage, MembershipApi};
use crate::error::{MembersError, Result};
use crate::types::{DesiredMember, GroupId, ObservedMember};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A recorded API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    List(u32),
    Add(u64),
    Edit(u64),
    Remove(u64),
}

#[derive(Default)]
struct State {
    groups: HashMap<String, Vec<ObservedMember>>,
    calls: Vec<Call>,
    fail_on: Option<Call>,
}

pub(crate) struct FakeGitLab {
    state: Mutex<State>,
    page_size: usize,
}

impl FakeGitLab {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: 2,
        }
    }

    pub(crate) fn with_group(group: &str, members: Vec<ObservedMember>) -> Self {
        let fake = Self::new();
        fake.add_group(group, members);
        fake
    }

    pub(crate) fn add_group(&self, group: &str, members: Vec<ObservedMember>) {
        self.state.lock().groups.insert(group.to_string(), members);
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Answer the given call with a 500.
    pub(crate) fn fail_on(&self, call: Call) {
        self.state.lock().fail_on = Some(call);
    }

    pub(crate) fn delete_group(&self, group: &str) {
        self.state.lock().groups.remove(group);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn mutating_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List(_)))
            .collect()
    }

    pub(crate) fn member_ids(&self, group: &str) -> Vec<u64> {
        let mut ids: Vec<u64> = self.state.lock().groups[group]
            .iter()
            .map(|m| m.user_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn member(&self, group: &str, user_id: u64) -> Option<ObservedMember> {
        self.state.lock().groups[group]
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned()
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.fail_on == Some(call) {
            return Err(MembersError::Api {
                status: 500,
                body: "injected failure".into(),
            });
        }
        Ok(())
    }
}

fn stored(member: &DesiredMember) -> ObservedMember {
    ObservedMember {
        user_id: member.user_id,
        access_level: AccessLevel::from_value(member.access_level.value())
            .unwrap_or(member.access_level),
        expires_at: member.expires_at.clone(),
        username: format!("user{}", member.user_id),
        name: format!("User {}", member.user_id),
        state: "active".to_string(),
    }
}

#[async_trait]
impl MembershipApi for FakeGitLab {
    async fn list_members(&self, group: &GroupId, page: u32) -> Result<MemberPage> {
        self.record(Call::List(page))?;
        let state = self.state.lock();
        let members = state
            .groups
            .get(group.as_str())
            .ok_or_else(|| MembersError::NotFound(group.to_string()))?;

        let total_pages = members.len().div_ceil(self.page_size).max(1) as u32;
        let start = (page as usize - 1) * self.page_size;
        Ok(MemberPage {
            members: members.iter().skip(start).take(self.page_size).cloned().collect(),
            total_pages,
        })
    }

    async fn add_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember> {
        self.record(Call::Add(member.user_id))?;
        let mut state = self.state.lock();
        let members = state
            .groups
            .get_mut(group.as_str())
            .ok_or_else(|| MembersError::NotFound(group.to_string()))?;

        if members.iter().any(|m| m.user_id == member.user_id) {
            return Err(MembersError::Conflict("Member already exists".into()));
        }
        let created = stored(member);
        members.push(created.clone());
        Ok(created)
    }

    async fn edit_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember> {
        self.record(Call::Edit(member.user_id))?;
        let mut state = self.state.lock();
        let current = state
            .groups
            .get_mut(group.as_str())
            .and_then(|members| members.iter_mut().find(|m| m.user_id == member.user_id))
            .ok_or_else(|| MembersError::NotFound(member.user_id.to_string()))?;

        *current = stored(member);
        Ok(current.clone())
    }

    async fn remove_member(&self, group: &GroupId, user_id: u64) -> Result<()> {
        self.record(Call::Remove(user_id))?;
        let mut state = self.state.lock();
        let members = state
            .groups
            .get_mut(group.as_str())
            .ok_or_else(|| MembersError::NotFound(group.to_string()))?;

        let before = members.len();
        members.retain(|m| m.user_id != user_id);
        if members.len() == before {
            return Err(MembersError::NotFound(user_id.to_string()));
        }
        Ok(())
    }
}
