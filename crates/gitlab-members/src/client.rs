//! GitLab group membership API client.

use crate::access::AccessLevel;
use crate::config::ProviderConfig;
use crate::error::{MembersError, Result};
use crate::types::{DesiredMember, GroupId, ObservedMember};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Page size requested from the list endpoint.
pub const PER_PAGE: u32 = 100;

/// One page of a membership listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPage {
    /// Members on this page.
    pub members: Vec<ObservedMember>,
    /// Total number of pages reported by the server.
    pub total_pages: u32,
}

/// Remote membership operations of a GitLab group.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    /// Fetch one page (1-indexed) of the group's members.
    async fn list_members(&self, group: &GroupId, page: u32) -> Result<MemberPage>;

    /// Add a user to the group.
    async fn add_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember>;

    /// Change the access level and expiry of an existing member.
    async fn edit_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember>;

    /// Remove a user from the group.
    async fn remove_member(&self, group: &GroupId, user_id: u64) -> Result<()>;
}

#[async_trait]
impl<T: MembershipApi + ?Sized> MembershipApi for Arc<T> {
    async fn list_members(&self, group: &GroupId, page: u32) -> Result<MemberPage> {
        (**self).list_members(group, page).await
    }

    async fn add_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember> {
        (**self).add_member(group, member).await
    }

    async fn edit_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember> {
        (**self).edit_member(group, member).await
    }

    async fn remove_member(&self, group: &GroupId, user_id: u64) -> Result<()> {
        (**self).remove_member(group, user_id).await
    }
}

/// GitLab API member representation.
#[derive(Debug, Deserialize)]
struct GitLabGroupMember {
    id: u64,
    #[serde(default)]
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    access_level: u8,
    expires_at: Option<String>,
}

impl TryFrom<GitLabGroupMember> for ObservedMember {
    type Error = MembersError;

    fn try_from(member: GitLabGroupMember) -> Result<Self> {
        let access_level = AccessLevel::from_value(member.access_level).ok_or_else(|| {
            MembersError::InvalidResponse(format!(
                "user {} has unsupported access level {}",
                member.id, member.access_level
            ))
        })?;

        Ok(Self {
            user_id: member.id,
            access_level,
            expires_at: member.expires_at,
            username: member.username,
            name: member.name,
            state: member.state,
        })
    }
}

#[derive(Debug, Serialize)]
struct AddMemberRequest<'a> {
    user_id: u64,
    access_level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<&'a str>,
}

/// Edit requests always carry `expires_at`; `null` clears the expiry.
#[derive(Debug, Serialize)]
struct EditMemberRequest<'a> {
    access_level: u8,
    expires_at: Option<&'a str>,
}

/// Client for the GitLab v4 REST API.
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: String,
}

impl GitLabClient {
    /// Create a new GitLab client.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate_settings()?;

        let mut builder = Client::builder()
            .user_agent("gitlab-members")
            .timeout(std::time::Duration::from_secs(30))
            .danger_accept_invalid_certs(config.insecure);

        if let Some(path) = &config.cacert_file {
            let pem = std::fs::read(path)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        let client = builder
            .build()
            .map_err(|e| MembersError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url()?,
            token: config.token.clone(),
        })
    }

    /// URL of `/groups/:id/members[/:user_id]`, with the group path
    /// percent-encoded as a single segment.
    fn members_url(&self, group: &GroupId, user_id: Option<u64>) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| MembersError::InvalidConfig("base_url cannot be a base".into()))?;
            segments
                .pop_if_empty()
                .extend(["groups", group.as_str(), "members"]);
            if let Some(user_id) = user_id {
                segments.push(&user_id.to_string());
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("PRIVATE-TOKEN", &self.token)
    }

    /// Send a request and classify non-success responses.
    async fn send(&self, request: RequestBuilder, path: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MembersError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MembersError::from_status(status, path, body));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<(T, HeaderMap)> {
        let response = self.send(request, path).await?;
        let headers = response.headers().clone();
        let body = response
            .json()
            .await
            .map_err(|e| MembersError::InvalidResponse(e.to_string()))?;
        Ok((body, headers))
    }
}

/// Total page count from GitLab's pagination headers.
///
/// GitLab omits `X-Total-Pages` for very large collections; a non-empty
/// `X-Next-Page` then signals that another page follows.
fn total_pages(headers: &HeaderMap, page: u32) -> u32 {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(total) = header("x-total-pages").and_then(|v| v.parse().ok()) {
        return total;
    }

    match header("x-next-page") {
        Some(_) => page + 1,
        None => page,
    }
}

#[async_trait]
impl MembershipApi for GitLabClient {
    async fn list_members(&self, group: &GroupId, page: u32) -> Result<MemberPage> {
        let url = self.members_url(group, None)?;
        let path = url.path().to_string();
        debug!(group = %group, page, "Listing group members");

        let request = self
            .request(Method::GET, url)
            .query(&[("page", page), ("per_page", PER_PAGE)]);
        let (members, headers): (Vec<GitLabGroupMember>, _) =
            self.send_json(request, &path).await?;

        Ok(MemberPage {
            members: members
                .into_iter()
                .map(ObservedMember::try_from)
                .collect::<Result<_>>()?,
            total_pages: total_pages(&headers, page),
        })
    }

    async fn add_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember> {
        let url = self.members_url(group, None)?;
        let path = url.path().to_string();

        let request = self.request(Method::POST, url).json(&AddMemberRequest {
            user_id: member.user_id,
            access_level: member.access_level.value(),
            expires_at: member.expires_at.as_deref(),
        });
        let (created, _): (GitLabGroupMember, _) = self.send_json(request, &path).await?;
        created.try_into()
    }

    async fn edit_member(&self, group: &GroupId, member: &DesiredMember) -> Result<ObservedMember> {
        let url = self.members_url(group, Some(member.user_id))?;
        let path = url.path().to_string();

        let request = self.request(Method::PUT, url).json(&EditMemberRequest {
            access_level: member.access_level.value(),
            expires_at: member.expires_at.as_deref(),
        });
        let (edited, _): (GitLabGroupMember, _) = self.send_json(request, &path).await?;
        edited.try_into()
    }

    async fn remove_member(&self, group: &GroupId, user_id: u64) -> Result<()> {
        let url = self.members_url(group, Some(user_id))?;
        let path = url.path().to_string();

        self.send(self.request(Method::DELETE, url), &path).await?;
        Ok(())
    }
}
