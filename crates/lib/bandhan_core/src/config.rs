//! Runtime configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::authority::DEFAULT_LOGIN_HOST;
use crate::azure::DEFAULT_MANAGEMENT_URL;
use crate::mapping::DEFAULT_MAPPING_API_URL;
use crate::mapping::permissions::DEFAULT_PERMISSIONS_API_URL;

/// Application (client) id registered in Azure AD.
pub const DEFAULT_CLIENT_ID: &str = "6895d99a-464c-498c-8271-bb4bc03c520e";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/";
pub const DEFAULT_LOGIN_SCOPES: &str =
    "https://management.core.windows.net/user_impersonation user.read";
pub const DEFAULT_AZURE_API_SCOPES: &str =
    "https://management.core.windows.net/user_impersonation";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL for {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandhanConfig {
    pub client_id: String,
    /// Where the identity platform sends the browser after sign-in.
    pub redirect_uri: Url,
    /// Scopes requested at login.
    pub login_scopes: Vec<String>,
    /// Scopes requested for Resource Manager calls.
    pub azure_api_scopes: Vec<String>,
    pub login_host: String,
    pub management_url: String,
    pub mapping_api_url: String,
    pub permissions_api_url: String,
    pub http_timeout: Duration,
}

impl BandhanConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                      | Default                                   |
    /// |-------------------------------|-------------------------------------------|
    /// | `BANDHAN_CLIENT_ID`           | registered Bandhan app id                 |
    /// | `BANDHAN_REDIRECT_URI`        | `http://localhost:3000/`                  |
    /// | `BANDHAN_LOGIN_SCOPES`        | ARM impersonation + `user.read`           |
    /// | `BANDHAN_AZURE_API_SCOPES`    | ARM impersonation                         |
    /// | `BANDHAN_LOGIN_HOST`          | `https://login.microsoftonline.com`       |
    /// | `BANDHAN_MANAGEMENT_URL`      | `https://management.azure.com`            |
    /// | `BANDHAN_MAPPING_API_URL`     | `https://bandhanv1.azurewebsites.net`     |
    /// | `BANDHAN_PERMISSIONS_API_URL` | `https://localhost:44381`                 |
    /// | `BANDHAN_HTTP_TIMEOUT_SECS`   | `30`                                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`, falling back to defaults for
    /// missing or blank values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let redirect = get("BANDHAN_REDIRECT_URI", DEFAULT_REDIRECT_URI);
        let redirect_uri = Url::parse(&redirect).map_err(|_| ConfigError::InvalidUrl {
            key: "BANDHAN_REDIRECT_URI",
            value: redirect.clone(),
        })?;

        let timeout = get(
            "BANDHAN_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        );
        let http_timeout = timeout
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| {
                ConfigError::ValidationError(format!(
                    "BANDHAN_HTTP_TIMEOUT_SECS must be a number of seconds, got '{timeout}'"
                ))
            })?;

        let config = Self {
            client_id: get("BANDHAN_CLIENT_ID", DEFAULT_CLIENT_ID),
            redirect_uri,
            login_scopes: split_scopes(&get("BANDHAN_LOGIN_SCOPES", DEFAULT_LOGIN_SCOPES)),
            azure_api_scopes: split_scopes(&get(
                "BANDHAN_AZURE_API_SCOPES",
                DEFAULT_AZURE_API_SCOPES,
            )),
            login_host: get("BANDHAN_LOGIN_HOST", DEFAULT_LOGIN_HOST),
            management_url: get("BANDHAN_MANAGEMENT_URL", DEFAULT_MANAGEMENT_URL),
            mapping_api_url: get("BANDHAN_MAPPING_API_URL", DEFAULT_MAPPING_API_URL),
            permissions_api_url: get("BANDHAN_PERMISSIONS_API_URL", DEFAULT_PERMISSIONS_API_URL),
            http_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every endpoint parses and both scope lists are non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("BANDHAN_LOGIN_HOST", &self.login_host),
            ("BANDHAN_MANAGEMENT_URL", &self.management_url),
            ("BANDHAN_MAPPING_API_URL", &self.mapping_api_url),
            ("BANDHAN_PERMISSIONS_API_URL", &self.permissions_api_url),
        ] {
            if Url::parse(value).is_err() {
                return Err(ConfigError::InvalidUrl {
                    key,
                    value: value.clone(),
                });
            }
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::ValidationError("client id is required".into()));
        }
        if self.login_scopes.is_empty() || self.azure_api_scopes.is_empty() {
            return Err(ConfigError::ValidationError(
                "scope lists must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Scopes are separated by whitespace or commas.
fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
