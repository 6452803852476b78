//! Conversion of member declarations into desired members.

use crate::access::AccessLevel;
use crate::error::{MembersError, Result};
use crate::types::{DesiredMember, MemberDeclaration};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Date format GitLab uses for membership expiry.
pub const EXPIRES_AT_FORMAT: &str = "%Y-%m-%d";

/// Normalize declarations into desired members.
///
/// Declared values are kept verbatim: a `master` declaration stays `master`
/// and expiry strings are not reformatted. Duplicate user ids are rejected.
pub fn normalize(declarations: &[MemberDeclaration]) -> Result<Vec<DesiredMember>> {
    let mut seen = HashSet::with_capacity(declarations.len());
    let mut members = Vec::with_capacity(declarations.len());

    for declaration in declarations {
        let member = normalize_one(declaration)?;
        if !seen.insert(member.user_id) {
            return Err(MembersError::Validation(format!(
                "user {} is declared more than once",
                member.user_id
            )));
        }
        members.push(member);
    }

    Ok(members)
}

fn normalize_one(declaration: &MemberDeclaration) -> Result<DesiredMember> {
    let user_id = u64::try_from(declaration.id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            MembersError::Validation(format!("invalid user id {}", declaration.id))
        })?;

    let access_level: AccessLevel = declaration.access_level.parse()?;

    let expires_at = match declaration.expires_at.as_deref() {
        None | Some("") => None,
        Some(date) => {
            NaiveDate::parse_from_str(date, EXPIRES_AT_FORMAT).map_err(|e| {
                MembersError::Validation(format!(
                    "invalid expires_at {date:?} for user {user_id}: {e}"
                ))
            })?;
            Some(date.to_string())
        }
    };

    Ok(DesiredMember {
        user_id,
        access_level,
        expires_at,
    })
}
