//! Paginated listing of a group's current members.

use crate::client::MembershipApi;
use crate::error::{MembersError, Result};
use crate::types::{GroupId, ObservedMember};
use tracing::{debug, warn};

/// Fetch every member of the tracked group, following pagination until the
/// last page reported by GitLab.
///
/// If GitLab reports the group as missing, `tracked_id` is cleared and
/// [`MembersError::GroupGone`] is returned. Any other error aborts the
/// listing unchanged.
pub async fn list_group_members<A>(
    api: &A,
    tracked_id: &mut Option<GroupId>,
) -> Result<Vec<ObservedMember>>
where
    A: MembershipApi + ?Sized,
{
    let group = tracked_id
        .clone()
        .ok_or_else(|| MembersError::InvalidConfig("no group is tracked".into()))?;

    let mut members = Vec::new();
    let mut page = 1;

    loop {
        let result = match api.list_members(&group, page).await {
            Ok(result) => result,
            Err(e) if e.is_not_found() => {
                *tracked_id = None;
                let gone = MembersError::GroupGone(group.to_string());
                warn!(group = %group, "{gone}");
                return Err(gone);
            }
            Err(e) => return Err(e),
        };

        members.extend(result.members);

        if page >= result.total_pages {
            break;
        }
        page += 1;
    }

    debug!(group = %group, count = members.len(), pages = page, "Listed group members");
    Ok(members)
}
