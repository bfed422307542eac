//! Shared dependencies handed to every component.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::normalize::ErrorRecord;
use crate::auth::session::AuthSession;

/// The single status line shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Banner {
    #[default]
    None,
    Error(ErrorRecord),
    Success(String),
}

impl Banner {
    pub fn error(&self) -> Option<&ErrorRecord> {
        match self {
            Banner::Error(record) => Some(record),
            _ => None,
        }
    }

    pub fn success(&self) -> Option<&str> {
        match self {
            Banner::Success(message) => Some(message),
            _ => None,
        }
    }
}

/// Where components report success and failure. Holds at most one banner;
/// each report replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    banner: Arc<RwLock<Banner>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn clear(&self) {
        *self.banner.write().await = Banner::None;
    }

    pub async fn set_error(&self, message: impl Into<String>, debug: Option<String>) {
        self.report(ErrorRecord::new(message, debug)).await;
    }

    pub async fn report(&self, record: ErrorRecord) {
        *self.banner.write().await = Banner::Error(record);
    }

    pub async fn set_success(&self, message: impl Into<String>) {
        *self.banner.write().await = Banner::Success(message.into());
    }

    pub async fn banner(&self) -> Banner {
        self.banner.read().await.clone()
    }
}

/// Dependencies passed explicitly into component constructors.
#[derive(Clone)]
pub struct AppContext {
    pub auth: Arc<AuthSession>,
    pub sink: ErrorSink,
}

impl AppContext {
    pub fn new(auth: Arc<AuthSession>) -> Self {
        Self {
            auth,
            sink: ErrorSink::new(),
        }
    }
}
