//! Shared plumbing for the HTTP collaborators.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised by the REST collaborators.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    /// Non-2xx response; `message` is what the backend said.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Build the shared HTTP client.
pub fn http_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Transport(format!("HTTP client setup failed: {e}")))
}

/// Turn a non-success response into [`ApiError::Status`], passing 2xx through.
///
/// The error message is the JSON body's `message` (or `Message`) field when
/// present, else the raw body, else the status line.
pub async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Check the status and decode the JSON body.
pub async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    check_status(resp)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = ["message", "Message"]
            .iter()
            .find_map(|k| value.get(k).and_then(|m| m.as_str()))
            .or_else(|| {
                value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
            });
        if let Some(message) = message {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}
