//! Client services granted permissions by the backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::api::{ApiError, read_json};
use crate::auth::normalize::normalize_error;
use crate::context::ErrorSink;

/// Default client-permissions backend.
pub const DEFAULT_PERMISSIONS_API_URL: &str = "https://localhost:44381";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientService {
    #[serde(rename = "ClientId")]
    pub client_id: String,
}

#[async_trait]
pub trait ClientPermissionsApi: Send + Sync {
    async fn list_client_services(&self) -> Result<Vec<ClientService>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct PermissionsClient {
    http: Client,
    base_url: String,
}

impl PermissionsClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ClientPermissionsApi for PermissionsClient {
    async fn list_client_services(&self) -> Result<Vec<ClientService>, ApiError> {
        let url = format!("{}/api/client-permissions", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Listing client services failed: {e}")))?;
        read_json(resp).await
    }
}

/// The client services list shown alongside the mapping form.
pub struct ClientServices {
    sink: ErrorSink,
    api: Arc<dyn ClientPermissionsApi>,
    services: RwLock<Vec<ClientService>>,
}

impl ClientServices {
    pub fn new(sink: ErrorSink, api: Arc<dyn ClientPermissionsApi>) -> Self {
        Self {
            sink,
            api,
            services: RwLock::new(Vec::new()),
        }
    }

    /// Fetch the list. Failures go to the sink and leave the list empty.
    pub async fn load(&self) {
        match self.api.list_client_services().await {
            Ok(services) => *self.services.write().await = services,
            Err(e) => {
                warn!(error = %e, "client services listing failed");
                self.services.write().await.clear();
                self.sink.report(normalize_error(&e)).await;
            }
        }
    }

    pub async fn services(&self) -> Vec<ClientService> {
        self.services.read().await.clone()
    }
}
