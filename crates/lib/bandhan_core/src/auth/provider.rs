//! Identity provider seam.
//!
//! [`AuthSession`](super::session::AuthSession) talks to the identity
//! platform only through [`IdentityProvider`]. The production implementation
//! is [`crate::entra::EntraProvider`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// A failure raised by the identity provider.
///
/// `code` carries the protocol error code when the provider returned one
/// (e.g. `interaction_required`); `message` is the human readable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Parameters for an interactive login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub scopes: Vec<String>,
    /// Full authority URL; `None` means the common endpoint.
    pub authority: Option<String>,
}

/// Outcome of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    /// Tenant the signed-in account was issued a token for.
    pub tenant_id: String,
    /// Account display name, when the provider exposes one.
    pub account: Option<String>,
}

/// Parameters for a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub scopes: Vec<String>,
    /// Full authority URL; `None` means the common endpoint.
    pub authority: Option<String>,
}

/// An issued access token.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenResult {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TokenResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResult")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Identity platform operations used by the session.
///
/// Implementations own their token cache and serialize access to it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in interactively (consent prompt / browser).
    async fn login_interactive(&self, request: &LoginRequest) -> Result<LoginResult, ProviderError>;

    /// Obtain a token from the cached session without user interaction.
    async fn acquire_token_silent(&self, request: &TokenRequest)
    -> Result<TokenResult, ProviderError>;

    /// Obtain a token through an interactive prompt.
    async fn acquire_token_interactive(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, ProviderError>;

    /// Drop the cached session.
    fn logout(&self);
}
