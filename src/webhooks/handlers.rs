//! Handler registry: one optional callback slot per event type.
//!
//! Feature plugins populate the slots they care about; the demultiplexer looks
//! up exactly one slot per delivery. An empty slot and a handler that returns
//! an error are distinct outcomes: the former is reported to the dispatch
//! caller as [`DemuxError::UndefinedHandler`](super::DemuxError), the latter is
//! only logged.
//!
//! ```
//! use review_plugins::webhooks::EventHandlers;
//!
//! let handlers = EventHandlers::new().on_pull_request(|event| async move {
//!     tracing::info!(number = event.number, "pull request event");
//!     anyhow::Ok(())
//! });
//! assert!(handlers.pull_request.is_some());
//! assert!(handlers.push.is_none());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::events::{
    EventKind, IssueCommentEvent, IssueEvent, PullRequestEvent, PullRequestReviewCommentEvent,
    PullRequestReviewEvent, PushEvent, StatusEvent,
};

/// Future returned by a boxed handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// A registered handler for events of type `E`.
pub type Handler<E> = Arc<dyn Fn(E) -> HandlerFuture + Send + Sync + 'static>;

fn boxed<E, F, Fut>(f: F) -> Handler<E>
where
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

/// The set of handlers a server dispatches to.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub issues: Option<Handler<IssueEvent>>,
    pub issue_comment: Option<Handler<IssueCommentEvent>>,
    pub pull_request: Option<Handler<PullRequestEvent>>,
    pub pull_request_review: Option<Handler<PullRequestReviewEvent>>,
    pub pull_request_review_comment: Option<Handler<PullRequestReviewCommentEvent>>,
    pub push: Option<Handler<PushEvent>>,
    pub status: Option<Handler<StatusEvent>>,
}

impl EventHandlers {
    /// Creates a registry with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_issues<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(IssueEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.issues = Some(boxed(f));
        self
    }

    pub fn on_issue_comment<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(IssueCommentEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.issue_comment = Some(boxed(f));
        self
    }

    pub fn on_pull_request<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(PullRequestEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.pull_request = Some(boxed(f));
        self
    }

    pub fn on_pull_request_review<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(PullRequestReviewEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.pull_request_review = Some(boxed(f));
        self
    }

    pub fn on_pull_request_review_comment<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(PullRequestReviewCommentEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.pull_request_review_comment = Some(boxed(f));
        self
    }

    pub fn on_push<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(PushEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push = Some(boxed(f));
        self
    }

    pub fn on_status<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(StatusEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.status = Some(boxed(f));
        self
    }

    /// Returns true if a handler is registered for `kind`.
    pub fn handles(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Issues => self.issues.is_some(),
            EventKind::IssueComment => self.issue_comment.is_some(),
            EventKind::PullRequest => self.pull_request.is_some(),
            EventKind::PullRequestReview => self.pull_request_review.is_some(),
            EventKind::PullRequestReviewComment => self.pull_request_review_comment.is_some(),
            EventKind::Push => self.push.is_some(),
            EventKind::Status => self.status.is_some(),
        }
    }

    /// Returns the event types that have a handler, in [`EventKind::ALL`] order.
    pub fn registered(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.handles(*kind))
            .collect()
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("registered", &self.registered())
            .finish()
    }
}
