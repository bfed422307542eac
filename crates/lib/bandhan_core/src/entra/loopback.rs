//! Loopback listener that receives the authorization redirect.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tracing::debug;
use url::Url;

use crate::auth::provider::ProviderError;

const DONE_PAGE: &str = "<html><body><p>Sign-in complete. You can close this window and return to Bandhan.</p></body></html>";

/// How long open connections get to finish once the redirect arrived.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Query parameters delivered on the redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

type ResponseSlot = Arc<Mutex<Option<oneshot::Sender<AuthorizationResponse>>>>;

/// `GET <redirect path>`: hand the first response to the waiting flow.
async fn redirect_handler(
    State(slot): State<ResponseSlot>,
    Query(response): Query<AuthorizationResponse>,
) -> Html<&'static str> {
    if let Some(tx) = slot.lock().await.take() {
        let _ = tx.send(response);
    }
    Html(DONE_PAGE)
}

/// One-shot HTTP listener bound to the redirect URI's host and port.
pub struct RedirectListener {
    listener: TcpListener,
    redirect_uri: Url,
}

impl RedirectListener {
    /// Bind to the host and port of `redirect_uri`. Port `0` picks a free port.
    pub async fn bind(redirect_uri: &Url) -> Result<Self, ProviderError> {
        let host = redirect_uri
            .host_str()
            .ok_or_else(|| ProviderError::new(format!("Redirect URI has no host: {redirect_uri}")))?;
        let port = redirect_uri.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind((host, port)).await.map_err(|e| {
            ProviderError::new(format!("Could not listen on {host}:{port} for the sign-in redirect: {e}"))
        })?;
        let local = listener
            .local_addr()
            .map_err(|e| ProviderError::new(format!("Redirect listener address: {e}")))?;

        let mut redirect_uri = redirect_uri.clone();
        if redirect_uri.port_or_known_default() != Some(local.port()) {
            redirect_uri
                .set_port(Some(local.port()))
                .map_err(|_| ProviderError::new("Redirect URI cannot carry a port"))?;
        }
        debug!(redirect_uri = %redirect_uri, "redirect listener bound");
        Ok(Self {
            listener,
            redirect_uri,
        })
    }

    /// The redirect URI with the actually bound port.
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Serve until a request arrives on the redirect path. Other paths get 404.
    ///
    /// Dropping the returned future stops the server and releases the port.
    pub async fn wait(self) -> Result<AuthorizationResponse, ProviderError> {
        let (response_tx, response_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let app = Router::new()
            .route(self.redirect_uri.path(), get(redirect_handler))
            .with_state(Arc::new(Mutex::new(Some(response_tx))));

        let serve = axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .into_future();
        let mut serve = std::pin::pin!(serve);

        tokio::select! {
            response = response_rx => {
                let _ = stop_tx.send(());
                if tokio::time::timeout(SHUTDOWN_GRACE, &mut serve).await.is_err() {
                    debug!("redirect listener closed with connections still open");
                }
                response.map_err(|_| ProviderError::new("Redirect listener stopped before sign-in completed"))
            }
            result = &mut serve => Err(match result {
                Ok(()) => ProviderError::new("Redirect listener stopped before sign-in completed"),
                Err(e) => ProviderError::new(format!("Redirect listener failed: {e}")),
            }),
        }
    }
}
