//! Provider configuration.
//!
//! Settings are layered: built-in defaults, then an optional config file,
//! then `GITLAB_*` environment variables (`GITLAB_TOKEN`, `GITLAB_BASE_URL`,
//! `GITLAB_INSECURE`, `GITLAB_CACERT_FILE`).

use crate::error::{MembersError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;
use validator::Validate;

/// Default GitLab instance.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4";

/// Path suffix of the v4 REST API.
const API_SUFFIX: &str = "api/v4";

/// Connection settings for a GitLab instance.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ProviderConfig {
    /// Personal, group or project access token.
    #[validate(length(min = 1, message = "a GitLab token is required"))]
    pub token: String,

    /// Base URL of the instance, with or without the `/api/v4` suffix.
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,

    /// Additional PEM encoded CA certificate to trust.
    #[serde(default)]
    pub cacert_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl ProviderConfig {
    /// Create a configuration for the given instance and token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            insecure: false,
            cacert_file: None,
        }
    }

    /// Load the configuration from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)
            .map_err(config_error)?
            .set_default("insecure", false)
            .map_err(config_error)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("GITLAB").try_parsing(true))
            .build()
            .map_err(config_error)?;

        let config: ProviderConfig = settings.try_deserialize().map_err(config_error)?;
        config.validate_settings()?;
        Ok(config)
    }

    /// Validate field values.
    pub fn validate_settings(&self) -> Result<()> {
        self.validate()
            .map_err(|e| MembersError::InvalidConfig(e.to_string()))
    }

    /// API root, always ending in `/api/v4`.
    pub fn api_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MembersError::InvalidConfig(format!("base_url: {e}")))?;

        if !url.path().trim_end_matches('/').ends_with(API_SUFFIX) {
            url.path_segments_mut()
                .map_err(|()| MembersError::InvalidConfig("base_url cannot be a base".into()))?
                .pop_if_empty()
                .extend(API_SUFFIX.split('/'));
        }

        Ok(url)
    }
}

fn config_error(e: config::ConfigError) -> MembersError {
    MembersError::InvalidConfig(e.to_string())
}
