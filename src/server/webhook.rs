//! Webhook endpoint handler.
//!
//! Validates a GitHub delivery and hands it to the demultiplexer. Handlers
//! run on their own tasks, so the response never waits for plugin work.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::github::GitHubClient;
use crate::types::DeliveryId;
use crate::webhooks::{DemuxError, dispatch};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

pub const ACCEPTED_BODY: &str = "Event received. Have a nice day.";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("content-type must be application/json, got {0:?}")]
    UnsupportedContentType(String),

    #[error("missing {HEADER_SIGNATURE} header")]
    MissingSignature,

    /// Invalid signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// The body does not decode as its declared event type.
    #[error(transparent)]
    Decode(DemuxError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_)
            | WebhookError::UnsupportedContentType(_)
            | WebhookError::Decode(_) => StatusCode::BAD_REQUEST,
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::FORBIDDEN
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 200 OK: delivery accepted, including event types nothing handles
/// - 400 Bad Request: missing header, wrong content type, or undecodable body
/// - 403 Forbidden: missing or invalid signature
pub async fn webhook_handler<G: GitHubClient>(
    State(app_state): State<AppState<G>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id = DeliveryId::new(get_header(&headers, HEADER_DELIVERY)?);
    let signature_header = get_header(&headers, HEADER_SIGNATURE)
        .map_err(|_| WebhookError::MissingSignature)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !is_json(content_type) {
        return Err(WebhookError::UnsupportedContentType(content_type.to_string()));
    }

    debug!(
        delivery_id = %delivery_id,
        event_type = %event_type,
        "Received webhook"
    );

    // Nothing touches the body before the signature checks out.
    if let Err(e) = app_state.webhook_secret().verify(&body, &signature_header) {
        warn!(delivery_id = %delivery_id, error = %e, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    match dispatch(app_state.handlers(), &event_type, &delivery_id, &body) {
        // The handler task is detached; its outcome is logged on its own span.
        Ok(_handle) => Ok((StatusCode::OK, ACCEPTED_BODY)),
        Err(e) if e.is_routing() => Ok((StatusCode::OK, ACCEPTED_BODY)),
        Err(e) => {
            warn!(delivery_id = %delivery_id, error = %e, "Error parsing event");
            Err(WebhookError::Decode(e))
        }
    }
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

/// Accepts `application/json` with or without parameters such as a charset.
fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_header_rejects_missing_and_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_EVENT, "push".parse().unwrap());
        headers.insert(HEADER_DELIVERY, "".parse().unwrap());

        assert_eq!(get_header(&headers, HEADER_EVENT).unwrap(), "push");
        assert!(matches!(
            get_header(&headers, HEADER_DELIVERY),
            Err(WebhookError::MissingHeader(HEADER_DELIVERY))
        ));
        assert!(matches!(
            get_header(&headers, HEADER_SIGNATURE),
            Err(WebhookError::MissingHeader(HEADER_SIGNATURE))
        ));
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("Application/JSON"));
        assert!(!is_json("application/x-www-form-urlencoded"));
        assert!(!is_json(""));
    }

    #[test]
    fn error_statuses() {
        let status = |e: WebhookError| e.into_response().status();
        assert_eq!(status(WebhookError::MissingHeader(HEADER_EVENT)), StatusCode::BAD_REQUEST);
        assert_eq!(status(WebhookError::MissingSignature), StatusCode::FORBIDDEN);
        assert_eq!(status(WebhookError::InvalidSignature), StatusCode::FORBIDDEN);
        assert_eq!(
            status(WebhookError::UnsupportedContentType("text/plain".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
