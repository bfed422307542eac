//! Authentication and token acquisition.
//!
//! Wraps an [`provider::IdentityProvider`] behind [`session::AuthSession`],
//! which owns the sign-in state and implements the silent-then-interactive
//! token policy.

pub mod authority;
pub mod classify;
pub mod normalize;
pub mod provider;
pub mod session;

use thiserror::Error;

use provider::ProviderError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Interactive login failed or was dismissed.
    #[error("Authentication failed: {0}")]
    Authentication(ProviderError),

    /// Silent acquisition failed for a reason that interaction cannot fix.
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(ProviderError),

    /// Silent acquisition required interaction and the interactive retry failed.
    #[error("Interactive token acquisition failed: {0}")]
    InteractionRequired(ProviderError),
}

impl AuthError {
    /// The underlying identity provider failure.
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            AuthError::Authentication(e)
            | AuthError::TokenAcquisition(e)
            | AuthError::InteractionRequired(e) => e,
        }
    }
}
