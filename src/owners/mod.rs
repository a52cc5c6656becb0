//! Pull request ownership: who may approve, who may review, and how many
//! approvals are needed.
//!
//! A pull request labeled `sig/<name>` is owned by that SIG, whose members
//! come from the SIG directory configured for the repository. A pull request
//! without such a label falls back to the repository's collaborators with a
//! quorum of two.

mod service;
pub mod sig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::github::GitHubApiError;

pub use service::{OwnersService, sig_name_from_labels};
pub use sig::SigDirectory;

/// Label prefix that names a SIG.
pub const SIG_LABEL_PREFIX: &str = "sig/";

/// Quorum used when the owners are the repository collaborators.
pub const COLLABORATOR_QUORUM: u32 = 2;

pub const LIST_OWNERS_SUCCESS: &str = "List all owners success.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owners {
    pub approvers: Vec<String>,
    pub reviewers: Vec<String>,
    pub needs_lgtm: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnersResponse {
    pub data: Owners,
    pub message: String,
}

impl OwnersResponse {
    pub fn success(data: Owners) -> Self {
        OwnersResponse {
            data,
            message: LIST_OWNERS_SUCCESS.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OwnersError {
    #[error(transparent)]
    GitHub(#[from] GitHubApiError),

    /// The pull request names a SIG but no owners block gives a directory.
    #[error("pull request belongs to sig {sig} but {repo} has no sig_endpoint configured")]
    MissingSigEndpoint { repo: String, sig: String },

    #[error("request to {url} failed: {source}")]
    SigRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not get sig from {url}: HTTP {status}")]
    SigStatus { url: String, status: u16 },

    #[error("malformed sig response from {url}: {source}")]
    SigBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
