// @awa-component: AUTH-TokenAcquisition
//
//! Sign-in state and token acquisition.
//!
//! [`AuthSession`] moves between `Unauthenticated` and
//! `Authenticated(authority)`. Token requests log in first when no authority
//! is established, switch tenant context by logging in against the requested
//! tenant, then try silent acquisition and fall back to exactly one
//! interactive attempt when the silent failure asks for interaction.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::AuthError;
use super::authority::{COMMON_TENANT, DEFAULT_LOGIN_HOST, authority_url};
use super::classify::{InteractionClassifier, MarkerClassifier, SilentFailure};
use super::normalize::{ErrorRecord, normalize_error};
use super::provider::{IdentityProvider, LoginRequest, TokenRequest};

/// Observable sign-in state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub is_authenticated: bool,
    /// Tenant id of the established authority; empty until the first login.
    pub current_authority: String,
    pub last_error: Option<ErrorRecord>,
}

/// Token acquisition on top of an [`IdentityProvider`].
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    classifier: Box<dyn InteractionClassifier>,
    login_scopes: Vec<String>,
    login_host: String,
    session: RwLock<Session>,
}

impl AuthSession {
    /// Create a session using the default marker classifier and login host.
    pub fn new(provider: Arc<dyn IdentityProvider>, login_scopes: Vec<String>) -> Self {
        Self {
            provider,
            classifier: Box::new(MarkerClassifier::default()),
            login_scopes,
            login_host: DEFAULT_LOGIN_HOST.to_string(),
            session: RwLock::new(Session::default()),
        }
    }

    /// Replace the silent-failure classifier.
    pub fn with_classifier(mut self, classifier: impl InteractionClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Use a different login host when building tenant authorities.
    pub fn with_login_host(mut self, login_host: impl Into<String>) -> Self {
        self.login_host = login_host.into();
        self
    }

    /// Snapshot of the current state.
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Full authority URL for a tenant id; URLs pass through unchanged.
    fn resolve_authority(&self, authority: &str) -> String {
        if authority.contains("://") {
            authority.to_string()
        } else {
            authority_url(&self.login_host, authority)
        }
    }

    /// Sign in interactively, scoped to `authority` (tenant id or authority
    /// URL) when given.
    ///
    /// On failure the session reverts to unauthenticated and records the
    /// normalized error before returning it.
    pub async fn login(&self, authority: Option<&str>) -> Result<(), AuthError> {
        let request = LoginRequest {
            scopes: self.login_scopes.clone(),
            authority: authority
                .filter(|a| !a.is_empty())
                .map(|a| self.resolve_authority(a)),
        };
        info!(
            authority = request.authority.as_deref().unwrap_or(COMMON_TENANT),
            "interactive login"
        );

        match self.provider.login_interactive(&request).await {
            Ok(result) => {
                let mut session = self.session.write().await;
                session.is_authenticated = true;
                session.current_authority = result.tenant_id;
                session.last_error = None;
                info!(tenant = %session.current_authority, "login succeeded");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                let mut session = self.session.write().await;
                session.is_authenticated = false;
                session.last_error = Some(normalize_error(&e));
                Err(AuthError::Authentication(e))
            }
        }
    }

    /// Acquire an access token for `scopes`, scoped to the `authority` tenant.
    ///
    /// An empty `authority` keeps whatever tenant context is established.
    pub async fn get_access_token(
        &self,
        authority: &str,
        scopes: &[String],
    ) -> Result<String, AuthError> {
        let current = self.session.read().await.current_authority.clone();
        if current.is_empty() {
            self.login(Some(authority)).await?;
        } else if !authority.is_empty() && authority != current {
            debug!(from = %current, to = %authority, "switching tenant context");
            self.login(Some(authority)).await?;
        }

        // The requested tenant wins over shared state another login may have moved.
        let tenant = if authority.is_empty() {
            self.session.read().await.current_authority.clone()
        } else {
            authority.to_string()
        };
        let request = TokenRequest {
            scopes: scopes.to_vec(),
            authority: Some(self.resolve_authority(&tenant)),
        };

        let silent_error = match self.provider.acquire_token_silent(&request).await {
            Ok(token) => {
                debug!(tenant = %tenant, len = token.access_token.len(), "silent token acquired");
                return Ok(token.access_token);
            }
            Err(e) => e,
        };

        match self.classifier.classify(&silent_error) {
            SilentFailure::InteractionRequired => {
                info!(error = %silent_error, "silent acquisition needs interaction, prompting");
                let token = self
                    .provider
                    .acquire_token_interactive(&request)
                    .await
                    .map_err(AuthError::InteractionRequired)?;
                Ok(token.access_token)
            }
            SilentFailure::Other => {
                warn!(error = %silent_error, "silent token acquisition failed");
                Err(AuthError::TokenAcquisition(silent_error))
            }
        }
    }

    /// Drop the provider session and return to `Unauthenticated`.
    pub async fn logout(&self) {
        self.provider.logout();
        let mut session = self.session.write().await;
        session.is_authenticated = false;
        session.current_authority.clear();
        session.last_error = None;
        info!("logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::ProviderError;
    use crate::testing::{FakeProvider, HOME_TENANT, token_for};

    fn scopes() -> Vec<String> {
        vec!["https://management.core.windows.net/user_impersonation".to_string()]
    }

    fn session_with(provider: &Arc<FakeProvider>) -> AuthSession {
        AuthSession::new(provider.clone(), scopes())
    }

    #[tokio::test]
    async fn login_success_sets_authority() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider);

        auth.login(None).await.expect("login");

        let state = auth.session().await;
        assert!(state.is_authenticated);
        assert_eq!(state.current_authority, HOME_TENANT);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn login_failure_records_error_and_stays_unauthenticated() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_login(ProviderError::with_code("user_cancelled", "popup closed"));
        let auth = session_with(&provider);

        let err = auth.login(None).await.unwrap_err();
        assert!(matches!(err, AuthError::Authentication(_)));

        let state = auth.session().await;
        assert!(!state.is_authenticated);
        assert!(state.current_authority.is_empty());
        assert_eq!(state.last_error.expect("error").message, "popup closed");
    }

    #[tokio::test]
    async fn successful_login_clears_previous_error() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_login(ProviderError::new("dismissed"));
        let auth = session_with(&provider);

        assert!(auth.login(None).await.is_err());
        auth.login(None).await.expect("second login");
        assert!(auth.session().await.last_error.is_none());
    }

    #[tokio::test]
    async fn logout_returns_to_unauthenticated() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider);
        auth.login(None).await.expect("login");

        auth.logout().await;

        let state = auth.session().await;
        assert!(!state.is_authenticated);
        assert!(state.current_authority.is_empty());
        assert_eq!(provider.logouts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn logout_discards_last_error() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_login(ProviderError::new("dismissed"));
        let auth = session_with(&provider);
        assert!(auth.login(None).await.is_err());
        assert!(auth.session().await.last_error.is_some());

        auth.logout().await;

        assert!(auth.session().await.last_error.is_none());
    }

    #[tokio::test]
    async fn login_accepts_bare_tenant_id() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider);

        auth.login(Some("tenant-b")).await.expect("login");
        auth.login(Some("https://login.microsoftonline.com/tenant-c"))
            .await
            .expect("login");

        let logins = provider.logins.lock().unwrap().clone();
        assert_eq!(
            logins,
            vec![
                Some("https://login.microsoftonline.com/tenant-b".to_string()),
                Some("https://login.microsoftonline.com/tenant-c".to_string())
            ]
        );
        assert_eq!(auth.session().await.current_authority, "tenant-c");
    }

    #[tokio::test]
    async fn silent_request_targets_requested_tenant_not_shared_state() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider);
        auth.login(None).await.expect("login");
        // Another task's login lands while this request switches tenant.
        provider.sign_in_as("tenant-z");

        let token = auth
            .get_access_token("tenant-b", &scopes())
            .await
            .expect("token");

        assert_eq!(token, token_for("tenant-b"));
    }

    #[tokio::test]
    async fn first_token_request_logs_in_implicitly() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider);

        let token = auth.get_access_token("", &scopes()).await.expect("token");

        assert_eq!(token, token_for(HOME_TENANT));
        assert_eq!(provider.login_count(), 1);
        assert!(auth.session().await.is_authenticated);
    }

    #[tokio::test]
    async fn same_authority_does_not_log_in_again() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider);
        auth.login(None).await.expect("login");

        auth.get_access_token(HOME_TENANT, &scopes())
            .await
            .expect("token");
        auth.get_access_token("", &scopes()).await.expect("token");

        assert_eq!(provider.login_count(), 1);
    }

    #[tokio::test]
    async fn different_authority_switches_tenant_context() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider);
        auth.login(None).await.expect("login");

        let token = auth
            .get_access_token("tenant-b", &scopes())
            .await
            .expect("token");

        assert_eq!(token, token_for("tenant-b"));
        assert_eq!(auth.session().await.current_authority, "tenant-b");
        let logins = provider.logins.lock().unwrap().clone();
        assert_eq!(
            logins,
            vec![
                None,
                Some("https://login.microsoftonline.com/tenant-b".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn interaction_required_retries_interactively_once() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_silent(ProviderError::new(
            "AADSTS65001: interaction_required: consent missing",
        ));
        let auth = session_with(&provider);
        auth.login(None).await.expect("login");

        let token = auth.get_access_token("", &scopes()).await.expect("token");

        assert_eq!(token, format!("interactive-{}", token_for(HOME_TENANT)));
        assert_eq!(provider.silent_count(), 1);
        assert_eq!(provider.interactive_count(), 1);
    }

    #[tokio::test]
    async fn other_silent_failure_propagates_without_prompt() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_silent(ProviderError::with_code(
            "temporarily_unavailable",
            "service unavailable",
        ));
        let auth = session_with(&provider);
        auth.login(None).await.expect("login");

        let err = auth.get_access_token("", &scopes()).await.unwrap_err();

        assert!(matches!(err, AuthError::TokenAcquisition(_)));
        assert_eq!(err.provider_error().message, "service unavailable");
        assert_eq!(provider.interactive_count(), 0);
    }

    #[tokio::test]
    async fn failed_interactive_retry_is_terminal() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_silent(ProviderError::with_code("login_required", "no session"));
        provider.fail_interactive(ProviderError::new("popup blocked"));
        let auth = session_with(&provider);
        auth.login(None).await.expect("login");

        let err = auth.get_access_token("", &scopes()).await.unwrap_err();

        assert!(matches!(err, AuthError::InteractionRequired(_)));
        assert_eq!(provider.silent_count(), 1);
        assert_eq!(provider.interactive_count(), 1);
    }

    #[tokio::test]
    async fn failed_implicit_login_stops_token_request() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_login(ProviderError::new("dismissed"));
        let auth = session_with(&provider);

        let err = auth.get_access_token("", &scopes()).await.unwrap_err();

        assert!(matches!(err, AuthError::Authentication(_)));
        assert_eq!(provider.silent_count(), 0);
    }

    #[tokio::test]
    async fn custom_classifier_is_consulted() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_silent(ProviderError::new("anmeldung_erforderlich"));
        let auth = session_with(&provider)
            .with_classifier(MarkerClassifier::with_markers(["anmeldung_erforderlich"]));
        auth.login(None).await.expect("login");

        auth.get_access_token("", &scopes()).await.expect("token");
        assert_eq!(provider.interactive_count(), 1);
    }

    #[tokio::test]
    async fn login_host_override_shapes_authorities() {
        let provider = Arc::new(FakeProvider::default());
        let auth = session_with(&provider).with_login_host("http://127.0.0.1:9/");
        auth.login(None).await.expect("login");

        auth.get_access_token("tenant-c", &scopes())
            .await
            .expect("token");

        let logins = provider.logins.lock().unwrap().clone();
        assert_eq!(logins[1].as_deref(), Some("http://127.0.0.1:9/tenant-c"));
    }
}
