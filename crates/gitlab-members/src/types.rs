//! Common types for group membership management.

use crate::access::AccessLevel;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a GitLab group: a numeric ID or a full path such as
/// `parent/child`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(u64),
            Path(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => id.into(),
            Raw::Path(path) => path.into(),
        })
    }
}

impl GroupId {
    /// Create a group identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for GroupId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A member declaration as written by the operator, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDeclaration {
    /// GitLab user ID.
    pub id: i64,

    /// Access level name.
    pub access_level: String,

    /// Membership expiry date (`YYYY-MM-DD`); empty or absent means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl MemberDeclaration {
    /// Create a declaration without expiry.
    pub fn new(id: i64, access_level: impl Into<String>) -> Self {
        Self {
            id,
            access_level: access_level.into(),
            expires_at: None,
        }
    }

    /// Set the expiry date.
    pub fn with_expires_at(mut self, expires_at: impl Into<String>) -> Self {
        self.expires_at = Some(expires_at.into());
        self
    }
}

/// Declared configuration of a group members resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembersConfig {
    /// Group whose membership is managed.
    pub group_id: GroupId,

    /// Unordered member declarations.
    #[serde(default)]
    pub members: Vec<MemberDeclaration>,
}

/// A member the group should have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredMember {
    pub user_id: u64,
    pub access_level: AccessLevel,
    pub expires_at: Option<String>,
}

impl DesiredMember {
    /// Create a desired member without expiry.
    pub fn new(user_id: u64, access_level: AccessLevel) -> Self {
        Self {
            user_id,
            access_level,
            expires_at: None,
        }
    }

    /// Set the expiry date.
    pub fn with_expires_at(mut self, expires_at: impl Into<String>) -> Self {
        self.expires_at = Some(expires_at.into());
        self
    }
}

/// A member as currently reported by GitLab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMember {
    pub user_id: u64,
    pub access_level: AccessLevel,
    pub expires_at: Option<String>,
    pub username: String,
    pub name: String,
    pub state: String,
}

impl ObservedMember {
    /// Create an observed member with empty display fields.
    pub fn new(user_id: u64, access_level: AccessLevel) -> Self {
        Self {
            user_id,
            access_level,
            expires_at: None,
            username: String::new(),
            name: String::new(),
            state: "active".to_string(),
        }
    }

    /// Set the expiry date.
    pub fn with_expires_at(mut self, expires_at: impl Into<String>) -> Self {
        self.expires_at = Some(expires_at.into());
        self
    }
}

/// One member in the persisted state, in the declarative shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: u64,
    pub access_level: AccessLevel,
    /// Empty when the membership does not expire.
    #[serde(default)]
    pub expires_at: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

impl From<&ObservedMember> for MemberRecord {
    fn from(member: &ObservedMember) -> Self {
        Self {
            id: member.user_id,
            access_level: member.access_level,
            expires_at: member.expires_at.clone().unwrap_or_default(),
            username: member.username.clone(),
            name: member.name.clone(),
            state: member.state.clone(),
        }
    }
}

/// Lifecycle status of a group members resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Nothing has been created yet.
    #[default]
    Absent,
    /// Members were added but not yet read back.
    Created,
    /// Remote membership matches the declaration.
    Synced,
    /// Remote membership differs from the declaration.
    Drifted,
    /// Declared members were removed and the id cleared.
    Deleted,
}

/// Persisted state of a group members resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupMembersState {
    /// External key of the resource; `None` once the group is gone or the
    /// resource was deleted.
    pub id: Option<GroupId>,

    /// Group whose membership is managed.
    pub group_id: Option<GroupId>,

    /// Members as last read from GitLab.
    #[serde(default)]
    pub members: Vec<MemberRecord>,

    /// Lifecycle status.
    #[serde(default)]
    pub status: ResourceStatus,
}

impl GroupMembersState {
    /// State for a group that is tracked but not yet read.
    pub fn tracking(group_id: GroupId) -> Self {
        Self {
            id: Some(group_id.clone()),
            group_id: Some(group_id),
            members: Vec::new(),
            status: ResourceStatus::Created,
        }
    }

    /// Whether the resource currently exists.
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }
}
