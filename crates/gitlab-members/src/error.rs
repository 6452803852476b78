//! Error types for group membership operations.

use thiserror::Error;

/// Group membership errors.
#[derive(Debug, Error)]
pub enum MembersError {
    /// The managed group no longer exists. The tracked resource id has been
    /// cleared and the caller should treat the resource as deleted.
    #[error("removing all group members in {0} from state because group no longer exists in gitlab")]
    GroupGone(String),

    /// Resource not found on GitLab.
    #[error("Not found: {0}")]
    NotFound(String),

    /// GitLab refused the request because the resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failed to authenticate with GitLab.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request failed with an unexpected status.
    #[error("GitLab API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// GitLab answered with a payload this crate cannot interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Network error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid member declaration.
    #[error("Invalid member declaration: {0}")]
    Validation(String),

    /// Invalid provider configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl MembersError {
    /// Classify a non-success HTTP status and its body into a typed error.
    pub fn from_status(status: reqwest::StatusCode, path: &str, body: String) -> Self {
        if status == reqwest::StatusCode::NOT_FOUND {
            Self::NotFound(path.to_string())
        } else if status == reqwest::StatusCode::CONFLICT {
            Self::Conflict(body)
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Self::AuthenticationFailed(format!("{status}: {body}"))
        } else {
            Self::Api {
                status: status.as_u16(),
                body,
            }
        }
    }

    /// Whether GitLab reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::GroupGone(_))
    }

    /// Whether GitLab reported the resource as already existing.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Result type for group membership operations.
pub type Result<T> = std::result::Result<T, MembersError>;
