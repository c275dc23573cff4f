//! reqwest plumbing shared by the peer clients.
//!
//! Each helper performs one HTTP round-trip and classifies the outcome for
//! the gateway: connection errors, timeouts and 5xx are transient, other
//! non-success statuses are rejections.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use common::{AppError, AppResult, PeerServicesConfig};

use crate::gateway::AttemptError;

/// Build the HTTP client used for every peer.
pub fn build_http_client(config: &PeerServicesConfig) -> AppResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
}

/// Send the request and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AttemptError> {
    let response = send(request).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| AttemptError::Invalid(e.to_string()))
}

/// Send the request and ignore any body.
pub(crate) async fn send_empty(request: RequestBuilder) -> Result<(), AttemptError> {
    send(request).await.map(|_| ())
}

async fn send(request: RequestBuilder) -> Result<Response, AttemptError> {
    let response = request
        .send()
        .await
        .map_err(|e| AttemptError::Transient(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| status.to_string());

    if status.is_server_error() {
        Err(AttemptError::Transient(format!("{}: {}", status, message)))
    } else {
        Err(AttemptError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a readable message out of an error body (`error`, `message` or
/// `mensagem` field, or the raw text).
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["error", "message", "mensagem"] {
            if let Some(Value::String(msg)) = fields.get(key) {
                return Some(msg.clone());
            }
        }
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(""), None);
        assert_eq!(
            error_message(r#"{"error":"Estoque insuficiente"}"#).as_deref(),
            Some("Estoque insuficiente")
        );
        assert_eq!(
            error_message(r#"{"mensagem":"Produto nao encontrado"}"#).as_deref(),
            Some("Produto nao encontrado")
        );
        assert_eq!(error_message("plain text").as_deref(), Some("plain text"));
    }
}
