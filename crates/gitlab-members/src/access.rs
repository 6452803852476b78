//! GitLab access levels.

use crate::error::{MembersError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission tier of a group member.
///
/// `Master` is the deprecated name of `Maintainer`. It is kept as its own
/// variant so that a declared `master` renders back as `master`, while
/// [`AccessLevel::is_equivalent`] treats the two as the same permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Guest,
    Reporter,
    Developer,
    Master,
    Maintainer,
    Owner,
}

impl AccessLevel {
    /// All accepted names, in ascending order of permission.
    pub const NAMES: [&'static str; 6] =
        ["guest", "reporter", "developer", "master", "maintainer", "owner"];

    /// Numeric value used by the GitLab API.
    pub fn value(self) -> u8 {
        match self {
            AccessLevel::Guest => 10,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Master | AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
        }
    }

    /// Map an API value to its canonical level.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            10 => Some(AccessLevel::Guest),
            20 => Some(AccessLevel::Reporter),
            30 => Some(AccessLevel::Developer),
            40 => Some(AccessLevel::Maintainer),
            50 => Some(AccessLevel::Owner),
            _ => None,
        }
    }

    /// Name as declared.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Guest => "guest",
            AccessLevel::Reporter => "reporter",
            AccessLevel::Developer => "developer",
            AccessLevel::Master => "master",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Owner => "owner",
        }
    }

    /// Whether two levels grant the same permission.
    pub fn is_equivalent(self, other: AccessLevel) -> bool {
        self.value() == other.value()
    }

    /// Whether this is the owner level.
    pub fn is_owner(self) -> bool {
        self == AccessLevel::Owner
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = MembersError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "guest" => Ok(AccessLevel::Guest),
            "reporter" => Ok(AccessLevel::Reporter),
            "developer" => Ok(AccessLevel::Developer),
            "master" => Ok(AccessLevel::Master),
            "maintainer" => Ok(AccessLevel::Maintainer),
            "owner" => Ok(AccessLevel::Owner),
            other => Err(MembersError::Validation(format!(
                "unknown access level {other:?}, expected one of {}",
                Self::NAMES.join(", ")
            ))),
        }
    }
}
