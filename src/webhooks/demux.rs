//! Event demultiplexer.
//!
//! Turns a validated webhook delivery (event-type tag, delivery GUID, raw
//! body) into a typed event and hands it to the single handler registered for
//! that type.
//!
//! # Dispatch Strategy
//!
//! 1. The tag is matched against the seven known event types; anything else
//!    is [`DemuxError::UnknownEventType`]
//! 2. The payload is decoded; failure is [`DemuxError::Decode`] and no
//!    handler runs
//! 3. The delivery GUID is attached to the decoded event
//! 4. An empty slot is [`DemuxError::UndefinedHandler`]
//! 5. Otherwise the handler is spawned as its own task and its `JoinHandle`
//!    is returned without waiting for it
//!
//! Handler errors never reach the dispatch caller. They are logged inside the
//! handler task with the event type and GUID on the span.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span};

use crate::types::DeliveryId;

use super::events::{
    EventKind, IssueCommentEvent, IssueEvent, PullRequestEvent, PullRequestReviewCommentEvent,
    PullRequestReviewEvent, PushEvent, StatusEvent, WebhookEvent,
};
use super::handlers::{EventHandlers, Handler};

/// Error type for dispatch failures.
#[derive(Debug, Error)]
pub enum DemuxError {
    /// The payload did not match the schema of its event type.
    #[error("failed to decode {event_type} payload: {source}")]
    Decode {
        event_type: EventKind,
        #[source]
        source: serde_json::Error,
    },

    /// The event type is known but nothing is registered for it.
    #[error("undefined event handler for {0} events")]
    UndefinedHandler(EventKind),

    /// The event type is not one the demultiplexer understands.
    #[error("unknown event type: {0:?}")]
    UnknownEventType(String),
}

impl DemuxError {
    /// Returns true for the informational routing outcomes (no handler,
    /// unknown type), false for decode failures.
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            DemuxError::UndefinedHandler(_) | DemuxError::UnknownEventType(_)
        )
    }
}

/// Decodes `payload` as the event named by `event_type` and spawns the
/// registered handler.
///
/// Must be called from within a tokio runtime. The returned handle resolves
/// when the handler finishes; callers that only acknowledge the delivery can
/// drop it.
///
/// # Examples
///
/// ```
/// use review_plugins::types::DeliveryId;
/// use review_plugins::webhooks::{DemuxError, EventHandlers, dispatch};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let handlers = EventHandlers::new();
/// let err = dispatch(&handlers, "deployment", &DeliveryId::new("1"), b"{}").unwrap_err();
/// assert!(matches!(err, DemuxError::UnknownEventType(_)));
/// # }
/// ```
pub fn dispatch(
    handlers: &EventHandlers,
    event_type: &str,
    guid: &DeliveryId,
    payload: &[u8],
) -> Result<JoinHandle<()>, DemuxError> {
    let Some(kind) = EventKind::parse(event_type) else {
        debug!(
            event_type,
            event_guid = %guid,
            "Received an event type that no plugin asked for"
        );
        return Err(DemuxError::UnknownEventType(event_type.to_string()));
    };

    match kind {
        EventKind::Issues => route::<IssueEvent>(handlers.issues.as_ref(), guid, payload),
        EventKind::IssueComment => {
            route::<IssueCommentEvent>(handlers.issue_comment.as_ref(), guid, payload)
        }
        EventKind::PullRequest => {
            route::<PullRequestEvent>(handlers.pull_request.as_ref(), guid, payload)
        }
        EventKind::PullRequestReview => {
            route::<PullRequestReviewEvent>(handlers.pull_request_review.as_ref(), guid, payload)
        }
        EventKind::PullRequestReviewComment => route::<PullRequestReviewCommentEvent>(
            handlers.pull_request_review_comment.as_ref(),
            guid,
            payload,
        ),
        EventKind::Push => route::<PushEvent>(handlers.push.as_ref(), guid, payload),
        EventKind::Status => route::<StatusEvent>(handlers.status.as_ref(), guid, payload),
    }
}

/// Decodes a payload into `E` and attaches the delivery GUID.
pub fn decode<E: WebhookEvent>(guid: &DeliveryId, payload: &[u8]) -> Result<E, DemuxError> {
    let mut event: E = serde_json::from_slice(payload).map_err(|source| DemuxError::Decode {
        event_type: E::KIND,
        source,
    })?;
    event.attach_guid(guid.clone());
    Ok(event)
}

fn route<E: WebhookEvent>(
    slot: Option<&Handler<E>>,
    guid: &DeliveryId,
    payload: &[u8],
) -> Result<JoinHandle<()>, DemuxError> {
    let event = decode::<E>(guid, payload)?;

    let Some(handler) = slot else {
        debug!(
            event_type = %E::KIND,
            event_guid = %guid,
            "Received an event but no handler is registered"
        );
        return Err(DemuxError::UndefinedHandler(E::KIND));
    };

    let span = info_span!("handle_event", event_type = %E::KIND, event_guid = %guid);
    let handler = Arc::clone(handler);

    // Even a synchronous panic in the handler must stay inside the task.
    Ok(tokio::spawn(
        async move {
            if let Err(error) = handler(event).await {
                info!(error = %format!("{error:#}"), "Error handling event");
            }
        }
        .instrument(span),
    ))
}
