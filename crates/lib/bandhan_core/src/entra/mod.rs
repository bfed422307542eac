// @awa-component: AUTH-EntraProvider
//
//! Microsoft identity platform (Azure AD v2.0) provider.
//!
//! Interactive sign-in runs the authorization code flow with PKCE for a
//! public client: the authorize URL is handed to an [`InteractivePrompt`],
//! the redirect is received on a loopback [`loopback::RedirectListener`], and
//! the code is redeemed at the tenant's token endpoint. Silent acquisition
//! serves cached access tokens and falls back to the refresh token grant.

pub mod cache;
pub mod claims;
pub mod loopback;
pub mod pkce;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::authority::{COMMON_TENANT, authority_url, tenant_segment};
use crate::auth::provider::{
    IdentityProvider, LoginRequest, LoginResult, ProviderError, TokenRequest, TokenResult,
};
use crate::config::BandhanConfig;

use cache::{CachedToken, TokenCache};
use claims::decode_id_token;
use loopback::RedirectListener;
use pkce::{PkcePair, generate_state};

/// OpenID Connect scopes added to every interactive request.
const OIDC_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

/// How long to wait for the user to finish signing in.
pub const DEFAULT_INTERACTIVE_TIMEOUT: Duration = Duration::from_secs(300);

/// Shows the authorize URL to the user (browser launch, terminal prompt).
pub trait InteractivePrompt: Send + Sync {
    fn present(&self, authorize_url: &Url) -> Result<(), ProviderError>;
}

/// Token endpoint success body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

/// Token endpoint error body.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    suberror: Option<String>,
}

impl From<TokenErrorResponse> for ProviderError {
    fn from(body: TokenErrorResponse) -> Self {
        let mut message = body.error.clone();
        if let Some(desc) = body.error_description.filter(|d| !d.is_empty()) {
            message = format!("{message}: {desc}");
        }
        if let Some(sub) = body.suberror.filter(|s| !s.is_empty()) {
            message = format!("{message} ({sub})");
        }
        ProviderError::with_code(body.error, message)
    }
}

/// Tokens redeemed for one tenant.
struct Redeemed {
    tenant_id: String,
    account: Option<String>,
    token: TokenResult,
}

pub struct EntraProvider {
    http: Client,
    client_id: String,
    redirect_uri: Url,
    login_host: String,
    prompt: Arc<dyn InteractivePrompt>,
    cache: TokenCache,
    interactive_timeout: Duration,
    // One loopback listener at a time.
    interactive: Mutex<()>,
}

impl EntraProvider {
    pub fn new(http: Client, config: &BandhanConfig, prompt: Arc<dyn InteractivePrompt>) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            login_host: config.login_host.clone(),
            prompt,
            cache: TokenCache::new(),
            interactive_timeout: DEFAULT_INTERACTIVE_TIMEOUT,
            interactive: Mutex::new(()),
        }
    }

    pub fn with_interactive_timeout(mut self, timeout: Duration) -> Self {
        self.interactive_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    fn authority(&self, authority: Option<&str>) -> String {
        match authority {
            Some(a) if !a.is_empty() => a.trim_end_matches('/').to_string(),
            _ => authority_url(&self.login_host, COMMON_TENANT),
        }
    }

    fn authorize_url(
        &self,
        authority: &str,
        redirect_uri: &Url,
        scopes: &[String],
        state: &str,
        pkce: &PkcePair,
    ) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{authority}/oauth2/v2.0/authorize"))
            .map_err(|e| ProviderError::new(format!("Invalid authority '{authority}': {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("response_mode", "query")
            .append_pair("scope", &with_oidc_scopes(scopes))
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("prompt", "select_account");
        Ok(url)
    }

    /// Run the authorization code flow against `authority` and redeem the code.
    async fn authorize(&self, authority: &str, scopes: &[String]) -> Result<Redeemed, ProviderError> {
        let _guard = self.interactive.lock().await;

        let listener = RedirectListener::bind(&self.redirect_uri).await?;
        let redirect_uri = listener.redirect_uri().clone();
        let pkce = PkcePair::generate();
        let state = generate_state();
        let url = self.authorize_url(authority, &redirect_uri, scopes, &state, &pkce)?;

        info!(authority, "waiting for interactive sign-in");
        self.prompt.present(&url)?;

        let response = tokio::time::timeout(self.interactive_timeout, listener.wait())
            .await
            .map_err(|_| ProviderError::with_code("timed_out", "Timed out waiting for sign-in"))??;

        if let Some(error) = response.error {
            let message = match response.error_description {
                Some(desc) if !desc.is_empty() => format!("{error}: {desc}"),
                _ => error.clone(),
            };
            return Err(ProviderError::with_code(error, message));
        }
        if response.state.as_deref() != Some(state.as_str()) {
            return Err(ProviderError::with_code(
                "state_mismatch",
                "Sign-in response did not match the request",
            ));
        }
        let code = response
            .code
            .ok_or_else(|| ProviderError::new("Sign-in response carried no authorization code"))?;

        let exchange_scopes = single_resource_scopes(scopes);
        let scope = with_oidc_scopes(&exchange_scopes);
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
            ("scope", scope.as_str()),
        ];
        let body = self.token_request(authority, &params).await?;
        Ok(self.store(authority, &exchange_scopes, body))
    }

    async fn token_request(
        &self,
        authority: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, ProviderError> {
        let resp = self
            .http
            .post(format!("{authority}/oauth2/v2.0/token"))
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Token request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(error) => error.into(),
                Err(_) => ProviderError::new(format!("Token endpoint HTTP {status}: {body}")),
            });
        }

        resp.json::<TokenResponse>()
            .await
            .map_err(|e| ProviderError::new(format!("Token response parse error: {e}")))
    }

    /// Cache a token response and work out which tenant it belongs to.
    fn store(&self, authority: &str, scopes: &[String], body: TokenResponse) -> Redeemed {
        let claims = body
            .id_token
            .as_deref()
            .and_then(|t| decode_id_token(t).map_err(|e| warn!("ignoring id_token: {e}")).ok())
            .unwrap_or_default();

        let segment = tenant_segment(authority).to_string();
        let tenant_id = claims.tid.clone().unwrap_or_else(|| segment.clone());
        let expires_at = Utc::now() + chrono::Duration::seconds(body.expires_in.unwrap_or(3600));

        let mut tenants = vec![tenant_id.clone()];
        if segment != tenant_id && segment != COMMON_TENANT {
            tenants.push(segment);
        }
        for tenant in &tenants {
            self.cache.store_access_token(
                tenant,
                scopes,
                CachedToken {
                    access_token: body.access_token.clone(),
                    expires_at,
                },
            );
            if let Some(refresh) = &body.refresh_token {
                self.cache.store_refresh_token(tenant, refresh.clone());
            }
        }
        debug!(tenant = %tenant_id, "tokens cached");

        Redeemed {
            tenant_id,
            account: claims.account(),
            token: TokenResult {
                access_token: body.access_token,
                expires_at: Some(expires_at),
            },
        }
    }
}

#[async_trait]
impl IdentityProvider for EntraProvider {
    async fn login_interactive(&self, request: &LoginRequest) -> Result<LoginResult, ProviderError> {
        let authority = self.authority(request.authority.as_deref());
        let redeemed = self.authorize(&authority, &request.scopes).await?;
        info!(tenant = %redeemed.tenant_id, "signed in");
        Ok(LoginResult {
            tenant_id: redeemed.tenant_id,
            account: redeemed.account,
        })
    }

    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, ProviderError> {
        let authority = self.authority(request.authority.as_deref());
        let tenant = tenant_segment(&authority).to_string();

        if let Some(cached) = self.cache.access_token(&tenant, &request.scopes) {
            debug!(tenant = %tenant, "access token served from cache");
            return Ok(TokenResult {
                access_token: cached.access_token,
                expires_at: Some(cached.expires_at),
            });
        }

        let refresh = self.cache.refresh_token(&tenant).ok_or_else(|| {
            ProviderError::with_code(
                "login_required",
                format!("login_required: no cached session for tenant {tenant}"),
            )
        })?;

        let scope = with_oidc_scopes(&request.scopes);
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh.as_str()),
            ("scope", scope.as_str()),
        ];
        match self.token_request(&authority, &params).await {
            Ok(body) => Ok(self.store(&authority, &request.scopes, body).token),
            Err(e) => {
                if e.code.as_deref() == Some("invalid_grant") {
                    self.cache.forget_refresh_token(&tenant);
                }
                Err(e)
            }
        }
    }

    async fn acquire_token_interactive(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, ProviderError> {
        let authority = self.authority(request.authority.as_deref());
        Ok(self.authorize(&authority, &request.scopes).await?.token)
    }

    fn logout(&self) {
        self.cache.clear();
    }
}

fn with_oidc_scopes(scopes: &[String]) -> String {
    let mut all: Vec<&str> = scopes.iter().map(String::as_str).collect();
    for scope in OIDC_SCOPES {
        if !all.iter().any(|s| s.eq_ignore_ascii_case(scope)) {
            all.push(scope);
        }
    }
    all.join(" ")
}

/// Scopes for the resource of the first scope.
///
/// The token endpoint issues tokens for one resource; extra resources in the
/// login scopes are consented at the authorize step only. Bare scopes such as
/// `user.read` belong to Microsoft Graph.
fn single_resource_scopes(scopes: &[String]) -> Vec<String> {
    fn resource(scope: &str) -> &str {
        match scope.rfind('/') {
            Some(i) if scope.contains("://") => &scope[..i],
            _ => "https://graph.microsoft.com",
        }
    }
    let Some(first) = scopes.first() else {
        return Vec::new();
    };
    let primary = resource(first);
    scopes
        .iter()
        .filter(|s| resource(s).eq_ignore_ascii_case(primary))
        .cloned()
        .collect()
}
