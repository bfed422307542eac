//! In-crate fakes for the provider and API seams.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::api::ApiError;
use crate::auth::authority::tenant_segment;
use crate::auth::provider::{
    IdentityProvider, LoginRequest, LoginResult, ProviderError, TokenRequest, TokenResult,
};
use crate::azure::{DirectoryApi, SubscriptionOption, TenantOption};
use crate::mapping::{MappingApi, MappingRequest};

/// Tenant returned by a login that was not scoped to an authority.
pub const HOME_TENANT: &str = "home-tenant";

/// Token the fake provider issues for `tenant`.
pub fn token_for(tenant: &str) -> String {
    format!("token-for-{tenant}")
}

/// Scripted identity provider. Each failure queue is consumed front-first;
/// an empty queue means success.
#[derive(Default)]
pub struct FakeProvider {
    pub login_failures: Mutex<VecDeque<ProviderError>>,
    pub silent_failures: Mutex<VecDeque<ProviderError>>,
    pub interactive_failures: Mutex<VecDeque<ProviderError>>,
    pub logins: Mutex<Vec<Option<String>>>,
    /// When set, every login reports this tenant regardless of the authority.
    pub signed_in_tenant: Mutex<Option<String>>,
    pub silent_calls: AtomicUsize,
    pub interactive_calls: AtomicUsize,
    pub logouts: AtomicUsize,
}

impl FakeProvider {
    pub fn fail_login(&self, error: ProviderError) {
        self.login_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_silent(&self, error: ProviderError) {
        self.silent_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_interactive(&self, error: ProviderError) {
        self.interactive_failures.lock().unwrap().push_back(error);
    }

    pub fn sign_in_as(&self, tenant: &str) {
        *self.signed_in_tenant.lock().unwrap() = Some(tenant.to_string());
    }

    pub fn login_count(&self) -> usize {
        self.logins.lock().unwrap().len()
    }

    pub fn silent_count(&self) -> usize {
        self.silent_calls.load(Ordering::SeqCst)
    }

    pub fn interactive_count(&self) -> usize {
        self.interactive_calls.load(Ordering::SeqCst)
    }

    fn issue(request: &TokenRequest, prefix: &str) -> TokenResult {
        let tenant = request
            .authority
            .as_deref()
            .map(tenant_segment)
            .unwrap_or(HOME_TENANT);
        TokenResult {
            access_token: format!("{prefix}{}", token_for(tenant)),
            expires_at: None,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn login_interactive(&self, request: &LoginRequest) -> Result<LoginResult, ProviderError> {
        self.logins.lock().unwrap().push(request.authority.clone());
        if let Some(err) = self.login_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let tenant_id = match self.signed_in_tenant.lock().unwrap().clone() {
            Some(tenant) => tenant,
            None => request
                .authority
                .as_deref()
                .map(tenant_segment)
                .unwrap_or(HOME_TENANT)
                .to_string(),
        };
        Ok(LoginResult {
            tenant_id,
            account: Some("user@example.com".into()),
        })
    }

    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, ProviderError> {
        self.silent_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.silent_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(Self::issue(request, ""))
    }

    async fn acquire_token_interactive(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, ProviderError> {
        self.interactive_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.interactive_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(Self::issue(request, "interactive-"))
    }

    fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Directory fake keyed by bearer token. Requests for a gated token wait
/// until the gate's sender fires.
#[derive(Default)]
pub struct FakeDirectory {
    pub tenants: Mutex<Option<Vec<TenantOption>>>,
    pub subscriptions: Mutex<HashMap<String, Vec<SubscriptionOption>>>,
    pub failing_tokens: Mutex<Vec<String>>,
    pub gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    pub requested: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn with_tenants(tenants: &[(&str, &str)]) -> Self {
        let directory = Self::default();
        *directory.tenants.lock().unwrap() = Some(
            tenants
                .iter()
                .map(|(id, name)| TenantOption {
                    tenant_id: (*id).into(),
                    display_name: (*name).into(),
                })
                .collect(),
        );
        directory
    }

    pub fn set_subscriptions(&self, tenant: &str, ids: &[&str]) {
        self.subscriptions.lock().unwrap().insert(
            token_for(tenant),
            ids.iter()
                .map(|id| SubscriptionOption {
                    subscription_id: (*id).into(),
                    display_name: format!("Subscription {id}"),
                })
                .collect(),
        );
    }

    pub fn fail_subscriptions(&self, tenant: &str) {
        self.failing_tokens.lock().unwrap().push(token_for(tenant));
    }

    /// Hold subscription requests for `tenant` until the returned sender fires.
    pub fn gate(&self, tenant: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(token_for(tenant), rx);
        tx
    }

    pub fn was_requested(&self, tenant: &str) -> bool {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .any(|t| *t == token_for(tenant))
    }

    pub fn subscription_requests(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl DirectoryApi for FakeDirectory {
    async fn list_tenants(&self, _access_token: &str) -> Result<Vec<TenantOption>, ApiError> {
        self.tenants
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Status {
                status: 500,
                message: "tenant listing unavailable".into(),
            })
    }

    async fn list_subscriptions(
        &self,
        access_token: &str,
    ) -> Result<Vec<SubscriptionOption>, ApiError> {
        self.requested.lock().unwrap().push(access_token.to_string());
        let gate = self.gates.lock().unwrap().remove(access_token);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self
            .failing_tokens
            .lock()
            .unwrap()
            .iter()
            .any(|t| t == access_token)
        {
            return Err(ApiError::Status {
                status: 403,
                message: "AuthorizationFailed".into(),
            });
        }
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .unwrap_or_default())
    }
}

/// Mapping backend fake that records saved requests.
#[derive(Default)]
pub struct FakeMappingApi {
    pub saved: Mutex<Vec<MappingRequest>>,
    pub reject_with: Mutex<Option<String>>,
}

impl FakeMappingApi {
    pub fn rejecting(message: &str) -> Self {
        let api = Self::default();
        *api.reject_with.lock().unwrap() = Some(message.into());
        api
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl MappingApi for FakeMappingApi {
    async fn save_mapping(&self, request: &MappingRequest) -> Result<(), ApiError> {
        self.saved.lock().unwrap().push(request.clone());
        match self.reject_with.lock().unwrap().clone() {
            Some(message) => Err(ApiError::Status {
                status: 400,
                message,
            }),
            None => Ok(()),
        }
    }
}
