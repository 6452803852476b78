//! # GitLab Group Members
//!
//! Declarative management of GitLab group memberships. A declared member set
//! (user id, access level, expiry) is reconciled against what the GitLab v4
//! REST API reports for a group.
//!
//! ## Features
//!
//! - **Normalization**: declarations are validated and turned into desired members
//! - **Listing**: the full membership is fetched page by page
//! - **Reconciliation**: a keyed diff yields members to add, update and remove
//! - **Application**: mutations are issued one at a time; add conflicts are
//!   tolerated and owners are never removed
//! - **Lifecycle**: create, read, plan, update, delete and import of a tracked group
//!
//! ## Example
//!
//! ```rust,ignore
//! use gitlab_members::{GitLabClient, GroupMembersResource, GroupMembersState, ProviderConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = ProviderConfig::load(None)?;
//!     let resource = GroupMembersResource::new(GitLabClient::new(&provider)?);
//!
//!     let config = serde_yaml::from_str(&std::fs::read_to_string("members.yaml")?)?;
//!     let mut state = GroupMembersState::default();
//!     let report = resource.apply(&config, &mut state).await?;
//!
//!     println!("{} changes applied", report.total_changes());
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod apply;
pub mod client;
pub mod config;
pub mod error;
pub mod lister;
pub mod normalize;
pub mod reconcile;
pub mod resource;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types
pub use access::AccessLevel;
pub use apply::{Applier, ApplyReport};
pub use client::{GitLabClient, MemberPage, MembershipApi};
pub use crate::config::ProviderConfig;
pub use error::{MembersError, Result};
pub use lister::list_group_members;
pub use normalize::normalize;
pub use reconcile::{reconcile, MemberChanges};
pub use resource::{GroupMembersResource, Plan, PlanAction};
pub use types::*;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
