//! GitHub webhook event types.
//!
//! Each struct mirrors the subset of GitHub's webhook payload that policy
//! plugins read. Unknown fields are ignored and unknown `action` strings decode
//! to an `Other` variant, so a new GitHub action never turns into a decode
//! failure.
//!
//! The delivery GUID is not part of the payload; the demultiplexer attaches it
//! after decoding (see [`WebhookEvent::attach_guid`]).

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{DeliveryId, PrNumber, RepoId};

/// The webhook event types the demultiplexer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Issues,
    IssueComment,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    Push,
    Status,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Issues,
        EventKind::IssueComment,
        EventKind::PullRequest,
        EventKind::PullRequestReview,
        EventKind::PullRequestReviewComment,
        EventKind::Push,
        EventKind::Status,
    ];

    /// Parses the value of the `X-GitHub-Event` header.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "issues" => Some(EventKind::Issues),
            "issue_comment" => Some(EventKind::IssueComment),
            "pull_request" => Some(EventKind::PullRequest),
            "pull_request_review" => Some(EventKind::PullRequestReview),
            "pull_request_review_comment" => Some(EventKind::PullRequestReviewComment),
            "push" => Some(EventKind::Push),
            "status" => Some(EventKind::Status),
            _ => None,
        }
    }

    /// Returns the header value GitHub uses for this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Issues => "issues",
            EventKind::IssueComment => "issue_comment",
            EventKind::PullRequest => "pull_request",
            EventKind::PullRequestReview => "pull_request_review",
            EventKind::PullRequestReviewComment => "pull_request_review_comment",
            EventKind::Push => "push",
            EventKind::Status => "status",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed event that can be decoded from a webhook payload.
pub trait WebhookEvent: DeserializeOwned + Send + 'static {
    /// The event type this payload belongs to.
    const KIND: EventKind;

    /// Stores the delivery GUID on the decoded event.
    fn attach_guid(&mut self, guid: DeliveryId);

    /// Returns the delivery GUID attached by the demultiplexer.
    fn guid(&self) -> &DeliveryId;
}

// ============================================================================
// Shared payload pieces
// ============================================================================

/// A GitHub user or organization account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub id: u64,
}

/// A repository as embedded in webhook payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Repository {
    /// Returns an owner/repo identifier for policy lookups.
    pub fn repo_id(&self) -> RepoId {
        RepoId::new(&self.owner.login, &self.name)
    }
}

/// An issue or pull request label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Open/closed state shared by issues and pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
    #[serde(other)]
    Other,
}

/// An issue. Pull requests delivered through issue events carry the
/// `pull_request` link object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
    #[serde(default)]
    pub html_url: String,
}

impl Issue {
    /// Returns true if this issue is actually a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// A comment on an issue, a pull request conversation, or a diff line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub user: User,
    #[serde(default)]
    pub html_url: String,
    /// Diff path; only present on review comments.
    #[serde(default)]
    pub path: Option<String>,
}

/// A branch reference on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestBranch {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

/// A pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub head: PullRequestBranch,
    pub base: PullRequestBranch,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub html_url: String,
}

impl PullRequest {
    pub fn number(&self) -> PrNumber {
        PrNumber(self.number)
    }
}

// ============================================================================
// issues
// ============================================================================

/// Action performed on an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    Opened,
    Edited,
    Deleted,
    Closed,
    Reopened,
    Assigned,
    Unassigned,
    Labeled,
    Unlabeled,
    #[serde(other)]
    Other,
}

/// An `issues` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueEvent {
    pub action: IssueAction,
    pub issue: Issue,
    pub repository: Repository,
    /// The label added or removed, for `labeled`/`unlabeled`.
    #[serde(default)]
    pub label: Option<Label>,
    pub sender: User,
    #[serde(skip)]
    pub guid: DeliveryId,
}

impl WebhookEvent for IssueEvent {
    const KIND: EventKind = EventKind::Issues;

    fn attach_guid(&mut self, guid: DeliveryId) {
        self.guid = guid;
    }

    fn guid(&self) -> &DeliveryId {
        &self.guid
    }
}

// ============================================================================
// issue_comment
// ============================================================================

/// Action performed on an issue comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
    #[serde(other)]
    Other,
}

/// An `issue_comment` event.
///
/// Comments on the pull request conversation tab arrive here too; check
/// [`Issue::is_pull_request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub action: CommentAction,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
    #[serde(skip)]
    pub guid: DeliveryId,
}

impl WebhookEvent for IssueCommentEvent {
    const KIND: EventKind = EventKind::IssueComment;

    fn attach_guid(&mut self, guid: DeliveryId) {
        self.guid = guid;
    }

    fn guid(&self) -> &DeliveryId {
        &self.guid
    }
}

// ============================================================================
// pull_request
// ============================================================================

/// Action performed on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    Opened,
    Edited,
    Closed,
    Reopened,
    Synchronize,
    Assigned,
    Unassigned,
    Labeled,
    Unlabeled,
    ReviewRequested,
    ReviewRequestRemoved,
    ReadyForReview,
    ConvertedToDraft,
    #[serde(other)]
    Other,
}

/// A `pull_request` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PrAction,
    pub number: u64,
    pub pull_request: PullRequest,
    pub repository: Repository,
    #[serde(default)]
    pub label: Option<Label>,
    pub sender: User,
    #[serde(skip)]
    pub guid: DeliveryId,
}

impl WebhookEvent for PullRequestEvent {
    const KIND: EventKind = EventKind::PullRequest;

    fn attach_guid(&mut self, guid: DeliveryId) {
        self.guid = guid;
    }

    fn guid(&self) -> &DeliveryId {
        &self.guid
    }
}

// ============================================================================
// pull_request_review
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Submitted,
    Edited,
    Dismissed,
    #[serde(other)]
    Other,
}

/// State of a submitted review.
///
/// GitHub sends these lowercase in webhooks and uppercase in the REST API;
/// both spellings are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    #[serde(alias = "APPROVED")]
    Approved,
    #[serde(alias = "CHANGES_REQUESTED")]
    ChangesRequested,
    #[serde(alias = "COMMENTED")]
    Commented,
    #[serde(alias = "DISMISSED")]
    Dismissed,
    #[serde(alias = "PENDING")]
    Pending,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub user: User,
    #[serde(default)]
    pub body: Option<String>,
    pub state: ReviewState,
    #[serde(default)]
    pub html_url: String,
}

/// A `pull_request_review` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReviewEvent {
    pub action: ReviewAction,
    pub review: Review,
    pub pull_request: PullRequest,
    pub repository: Repository,
    #[serde(skip)]
    pub guid: DeliveryId,
}

impl WebhookEvent for PullRequestReviewEvent {
    const KIND: EventKind = EventKind::PullRequestReview;

    fn attach_guid(&mut self, guid: DeliveryId) {
        self.guid = guid;
    }

    fn guid(&self) -> &DeliveryId {
        &self.guid
    }
}

// ============================================================================
// pull_request_review_comment
// ============================================================================

/// A `pull_request_review_comment` event (a comment on a diff line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReviewCommentEvent {
    pub action: CommentAction,
    pub comment: Comment,
    pub pull_request: PullRequest,
    pub repository: Repository,
    #[serde(skip)]
    pub guid: DeliveryId,
}

impl WebhookEvent for PullRequestReviewCommentEvent {
    const KIND: EventKind = EventKind::PullRequestReviewComment;

    fn attach_guid(&mut self, guid: DeliveryId) {
        self.guid = guid;
    }

    fn guid(&self) -> &DeliveryId {
        &self.guid
    }
}

// ============================================================================
// push
// ============================================================================

/// A commit listed in a push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
}

/// The pusher. Push payloads identify them by name, not login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pusher {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A `push` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub before: String,
    pub after: String,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    pub repository: Repository,
    pub pusher: Pusher,
    #[serde(skip)]
    pub guid: DeliveryId,
}

impl PushEvent {
    /// Returns the branch name for `refs/heads/...` pushes.
    pub fn branch(&self) -> Option<&str> {
        self.ref_name.strip_prefix("refs/heads/")
    }
}

impl WebhookEvent for PushEvent {
    const KIND: EventKind = EventKind::Push;

    fn attach_guid(&mut self, guid: DeliveryId) {
        self.guid = guid;
    }

    fn guid(&self) -> &DeliveryId {
        &self.guid
    }
}

// ============================================================================
// status
// ============================================================================

/// State of a commit status (legacy Status API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
}

/// A `status` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub sha: String,
    pub state: StatusState,
    pub context: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    pub repository: Repository,
    #[serde(skip)]
    pub guid: DeliveryId,
}

impl WebhookEvent for StatusEvent {
    const KIND: EventKind = EventKind::Status;

    fn attach_guid(&mut self, guid: DeliveryId) {
        self.guid = guid;
    }

    fn guid(&self) -> &DeliveryId {
        &self.guid
    }
}
