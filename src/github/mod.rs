//! GitHub API access.
//!
//! The owners service needs two reads: a pull request's labels and a
//! repository's collaborators. [`GitHubClient`] is the seam between that logic
//! and the network, so the service can be exercised against an in-memory
//! double.

mod client;
mod error;

use std::future::Future;

pub use client::OctocrabClient;
pub use error::GitHubApiError;

use crate::types::{PrNumber, RepoId};

/// Read access to the parts of GitHub the owners service consults.
pub trait GitHubClient: Send + Sync + 'static {
    /// Label names on a pull request, in the order GitHub returns them.
    fn get_pull_request_labels(
        &self,
        repo: &RepoId,
        number: PrNumber,
    ) -> impl Future<Output = Result<Vec<String>, GitHubApiError>> + Send;

    /// Logins of every collaborator on a repository, across all pages.
    fn list_collaborators(
        &self,
        repo: &RepoId,
    ) -> impl Future<Output = Result<Vec<String>, GitHubApiError>> + Send;
}
