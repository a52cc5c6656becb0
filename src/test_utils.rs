//! Shared test doubles and arbitrary generators for property-based testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use crate::github::{GitHubApiError, GitHubClient};
use crate::types::{PrNumber, RepoId};

pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,8}"
}

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    any::<u64>().prop_map(PrNumber)
}

pub fn arb_repo_id() -> impl Strategy<Value = RepoId> {
    (arb_name(), arb_name()).prop_map(|(owner, repo)| RepoId::new(owner, repo))
}

/// In-memory GitHub that counts calls.
#[derive(Debug, Default)]
pub struct FakeGitHub {
    pub labels: Vec<String>,
    pub collaborators: Vec<String>,
    pub fail_labels: bool,
    pub fail_collaborators: bool,
    label_calls: AtomicUsize,
    collaborator_calls: AtomicUsize,
}

impl FakeGitHub {
    pub fn with_labels(labels: &[&str]) -> Self {
        FakeGitHub {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn collaborators(mut self, logins: &[&str]) -> Self {
        self.collaborators = logins.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Every label lookup fails with a 404.
    pub fn failing() -> Self {
        FakeGitHub {
            fail_labels: true,
            ..Default::default()
        }
    }

    /// Collaborator listing fails with a 403.
    pub fn failing_collaborators(mut self) -> Self {
        self.fail_collaborators = true;
        self
    }

    pub fn label_calls(&self) -> usize {
        self.label_calls.load(Ordering::SeqCst)
    }

    pub fn collaborator_calls(&self) -> usize {
        self.collaborator_calls.load(Ordering::SeqCst)
    }
}

impl GitHubClient for FakeGitHub {
    async fn get_pull_request_labels(
        &self,
        _repo: &RepoId,
        _number: PrNumber,
    ) -> Result<Vec<String>, GitHubApiError> {
        self.label_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_labels {
            return Err(GitHubApiError::without_source(Some(404), "Not Found"));
        }
        Ok(self.labels.clone())
    }

    async fn list_collaborators(&self, _repo: &RepoId) -> Result<Vec<String>, GitHubApiError> {
        self.collaborator_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_collaborators {
            return Err(GitHubApiError::without_source(Some(403), "Must have push access"));
        }
        Ok(self.collaborators.clone())
    }
}
