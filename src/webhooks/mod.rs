//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Typed event payloads for the seven event types plugins consume
//! - The handler registry and the demultiplexer that routes to it

pub mod demux;
pub mod events;
pub mod handlers;
pub mod signature;

pub use demux::{DemuxError, decode, dispatch};
pub use events::{EventKind, WebhookEvent};
pub use handlers::{EventHandlers, Handler, HandlerFuture};
pub use signature::{SignatureError, WebhookSecret};
