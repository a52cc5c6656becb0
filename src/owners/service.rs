use tracing::{error, instrument};

use super::sig::SigInfo;
use super::{COLLABORATOR_QUORUM, Owners, OwnersError, OwnersResponse, SIG_LABEL_PREFIX, SigDirectory};
use crate::config::Configuration;
use crate::github::GitHubClient;
use crate::types::{PrNumber, RepoId};

/// Returns the SIG named by the first `sig/` label, with the prefix stripped.
///
/// A bare `sig/` label names no group, even when a later label does.
///
/// ```
/// use review_plugins::owners::sig_name_from_labels;
///
/// let labels = ["type/bug", "sig/planner", "sig/execution"].map(String::from);
/// assert_eq!(sig_name_from_labels(&labels), Some("planner"));
/// assert_eq!(sig_name_from_labels(&["size/XS".to_string()]), None);
/// ```
pub fn sig_name_from_labels(labels: &[String]) -> Option<&str> {
    labels
        .iter()
        .find_map(|label| label.strip_prefix(SIG_LABEL_PREFIX))
        .filter(|sig| !sig.is_empty())
}

/// Answers "who owns this pull request".
#[derive(Debug)]
pub struct OwnersService<G> {
    github: G,
    sigs: SigDirectory,
}

impl<G: GitHubClient> OwnersService<G> {
    pub fn new(github: G, sigs: SigDirectory) -> Self {
        Self { github, sigs }
    }

    pub fn github(&self) -> &G {
        &self.github
    }

    /// Lists the owners of `org/repo` pull request `number` under `config`.
    ///
    /// Once a `sig/` label is present, failures reaching the SIG directory are
    /// returned as errors rather than falling back to collaborators.
    #[instrument(skip(self, config), fields(pr = %number))]
    pub async fn list_owners(
        &self,
        org: &str,
        repo: &str,
        number: PrNumber,
        config: &Configuration,
    ) -> Result<OwnersResponse, OwnersError> {
        let repo_id = RepoId::new(org, repo);
        let labels = self
            .github
            .get_pull_request_labels(&repo_id, number)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to get pull request"))?;

        let owners = match sig_name_from_labels(&labels) {
            None => self.collaborator_owners(&repo_id).await?,
            Some(sig) => {
                let endpoint = config.owners_for(org, repo).sig_endpoint;
                if endpoint.is_empty() {
                    error!(sig, "No sig_endpoint configured");
                    return Err(OwnersError::MissingSigEndpoint {
                        repo: repo_id.full_name(),
                        sig: sig.to_string(),
                    });
                }
                sig_owners(self.sigs.fetch(&endpoint, sig).await?)
            }
        };
        Ok(OwnersResponse::success(owners))
    }

    async fn collaborator_owners(&self, repo: &RepoId) -> Result<Owners, OwnersError> {
        let logins = self
            .github
            .list_collaborators(repo)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to get collaborators"))?;
        Ok(Owners {
            approvers: logins.clone(),
            reviewers: logins,
            needs_lgtm: COLLABORATOR_QUORUM,
        })
    }
}

/// Leaders, co-leaders and committers approve and review; reviewers only
/// review. Order follows the directory; duplicates are kept.
fn sig_owners(sig: SigInfo) -> Owners {
    let membership = sig.membership;
    let mut approvers = Vec::new();
    let mut reviewers = Vec::new();

    for member in membership
        .tech_leaders
        .into_iter()
        .chain(membership.co_leaders)
        .chain(membership.committers)
    {
        approvers.push(member.github_name.clone());
        reviewers.push(member.github_name);
    }
    reviewers.extend(membership.reviewers.into_iter().map(|m| m.github_name));

    Owners {
        approvers,
        reviewers,
        needs_lgtm: sig.needs_lgtm,
    }
}
