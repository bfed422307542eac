//! # bandhan_core
//!
//! Core domain logic for Bandhan: signing in against Azure AD, the cascading
//! tenant → subscription selection, and persisting an installation mapping.

pub mod api;
pub mod auth;
pub mod azure;
pub mod config;
pub mod context;
pub mod entra;
pub mod form;
pub mod installation;
pub mod mapping;
pub mod selector;

#[cfg(test)]
pub(crate) mod testing;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
