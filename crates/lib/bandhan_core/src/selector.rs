// @awa-component: SEL-CascadingSelector
//
//! Tenant → subscription cascading selection.
//!
//! Changing the tenant clears the subscription list before anything else
//! happens, then fetches the new tenant's subscriptions with a token scoped
//! to it. A fetch that resolves after the selection has moved on is dropped:
//! the originating tenant is compared with the selection at resolution time.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::normalize::{ErrorRecord, normalize_error};
use crate::azure::{DirectoryApi, SubscriptionOption, TenantOption};
use crate::context::AppContext;

/// Everything the selector shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub tenants: Vec<TenantOption>,
    pub selected_tenant: String,
    pub subscriptions: Vec<SubscriptionOption>,
    pub selected_subscription: String,
}

/// How a tenant change ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionLoad {
    /// Tenant cleared; nothing requested.
    Cleared,
    /// Subscriptions listed for the tenant (possibly none).
    Loaded(usize),
    /// The selection changed while the fetch was in flight; result dropped.
    Stale,
    /// Token or listing failure; the list stays empty.
    Failed,
}

pub struct CascadingSelector {
    context: AppContext,
    directory: Arc<dyn DirectoryApi>,
    scopes: Vec<String>,
    state: RwLock<SelectionState>,
}

impl CascadingSelector {
    pub fn new(context: AppContext, directory: Arc<dyn DirectoryApi>, scopes: Vec<String>) -> Self {
        Self {
            context,
            directory,
            scopes,
            state: RwLock::new(SelectionState::default()),
        }
    }

    pub async fn state(&self) -> SelectionState {
        self.state.read().await.clone()
    }

    pub async fn selected_tenant(&self) -> String {
        self.state.read().await.selected_tenant.clone()
    }

    pub async fn selected_subscription(&self) -> String {
        self.state.read().await.selected_subscription.clone()
    }

    /// Populate the tenant list using the default authority.
    ///
    /// Returns the number of tenants listed; failures are reported to the
    /// sink and leave the list empty.
    pub async fn load_tenants(&self) -> usize {
        let tenants = match self.fetch_tenants().await {
            Ok(tenants) => tenants,
            Err(record) => {
                self.state.write().await.tenants.clear();
                self.context.sink.report(record).await;
                return 0;
            }
        };
        info!(count = tenants.len(), "tenants loaded");
        let count = tenants.len();
        self.state.write().await.tenants = tenants;
        count
    }

    async fn fetch_tenants(&self) -> Result<Vec<TenantOption>, ErrorRecord> {
        let token = self
            .context
            .auth
            .get_access_token("", &self.scopes)
            .await
            .map_err(|e| {
                warn!(error = %e, "token for tenant listing failed");
                normalize_error(&e)
            })?;
        self.directory.list_tenants(&token).await.map_err(|e| {
            warn!(error = %e, "tenant listing failed");
            normalize_error(&e)
        })
    }

    /// Change the selected tenant and repopulate its subscriptions.
    pub async fn select_tenant(&self, tenant_id: &str) -> SubscriptionLoad {
        {
            let mut state = self.state.write().await;
            state.selected_tenant = tenant_id.to_string();
            state.subscriptions.clear();
            state.selected_subscription.clear();
        }
        self.context.sink.clear().await;

        if tenant_id.is_empty() {
            debug!("tenant cleared");
            return SubscriptionLoad::Cleared;
        }

        let fetched = self.fetch_subscriptions(tenant_id).await;

        let mut state = self.state.write().await;
        if state.selected_tenant != tenant_id {
            debug!(
                requested = %tenant_id,
                current = %state.selected_tenant,
                "discarding subscriptions for stale tenant"
            );
            return SubscriptionLoad::Stale;
        }

        match fetched {
            Ok(subscriptions) => {
                state.selected_subscription = subscriptions
                    .first()
                    .map(|s| s.subscription_id.clone())
                    .unwrap_or_default();
                let count = subscriptions.len();
                state.subscriptions = subscriptions;
                info!(tenant = %tenant_id, count, "subscriptions loaded");
                SubscriptionLoad::Loaded(count)
            }
            Err(record) => {
                drop(state);
                self.context.sink.report(record).await;
                SubscriptionLoad::Failed
            }
        }
    }

    async fn fetch_subscriptions(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<SubscriptionOption>, ErrorRecord> {
        let token = self
            .context
            .auth
            .get_access_token(tenant_id, &self.scopes)
            .await
            .map_err(|e| {
                warn!(tenant = %tenant_id, error = %e, "token for subscription listing failed");
                normalize_error(&e)
            })?;
        self.directory
            .list_subscriptions(&token)
            .await
            .map_err(|e| {
                warn!(tenant = %tenant_id, error = %e, "subscription listing failed");
                normalize_error(&e)
            })
    }

    /// Pick one of the listed subscriptions. Ids not in the current list are
    /// refused and leave the selection unchanged.
    pub async fn select_subscription(&self, subscription_id: &str) -> bool {
        let mut state = self.state.write().await;
        if state
            .subscriptions
            .iter()
            .any(|s| s.subscription_id == subscription_id)
        {
            state.selected_subscription = subscription_id.to_string();
            true
        } else {
            warn!(subscription = %subscription_id, tenant = %state.selected_tenant, "subscription not listed for tenant");
            false
        }
    }
}
