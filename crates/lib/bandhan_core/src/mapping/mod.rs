// @awa-component: MAP-MappingService
//
//! Installation mapping: the backend client, submission, and the client
//! permissions listing.

pub mod permissions;
pub mod submission;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::api::{ApiError, check_status};

/// Default mapping backend.
pub const DEFAULT_MAPPING_API_URL: &str = "https://bandhanv1.azurewebsites.net";

/// The triple persisted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingRequest {
    pub installation_id: String,
    pub tenant_id: String,
    pub subscription_id: String,
}

impl MappingRequest {
    pub fn new(
        installation_id: impl Into<String>,
        tenant_id: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            installation_id: installation_id.into(),
            tenant_id: tenant_id.into(),
            subscription_id: subscription_id.into(),
        }
    }

    /// All three fields are present.
    pub fn is_complete(&self) -> bool {
        !self.installation_id.is_empty()
            && !self.tenant_id.is_empty()
            && !self.subscription_id.is_empty()
    }
}

/// Wire body for `POST /api/installation-scopes`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SaveMappingBody<'a> {
    installation_id: i64,
    tenant_id: &'a str,
    subscription_id: &'a str,
}

/// Persists mappings.
#[async_trait]
pub trait MappingApi: Send + Sync {
    async fn save_mapping(&self, request: &MappingRequest) -> Result<(), ApiError>;
}

/// Client for the Bandhan backend.
#[derive(Debug, Clone)]
pub struct MappingClient {
    http: Client,
    base_url: String,
}

impl MappingClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MappingApi for MappingClient {
    async fn save_mapping(&self, request: &MappingRequest) -> Result<(), ApiError> {
        let installation_id = request
            .installation_id
            .trim()
            .parse::<i64>()
            .map_err(|_| {
                ApiError::InvalidRequest(format!(
                    "Installation id must be numeric, got '{}'",
                    request.installation_id
                ))
            })?;

        let url = format!("{}/api/installation-scopes", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SaveMappingBody {
                installation_id,
                tenant_id: &request.tenant_id,
                subscription_id: &request.subscription_id,
            })
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Saving mapping failed: {e}")))?;

        check_status(resp).await?;
        info!(installation_id, tenant = %request.tenant_id, "mapping saved");
        Ok(())
    }
}
