//! Octocrab-backed implementation of [`GitHubClient`].

use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GitHubApiError, GitHubClient};
use crate::types::{PrNumber, RepoId};

/// GitHub's maximum page size.
const PER_PAGE: u8 = 100;

/// A GitHub API client shared across repositories.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

#[derive(Deserialize)]
struct RawCollaborator {
    login: String,
}

impl OctocrabClient {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates a client from a personal access token, talking to `base_uri`
    /// (`https://api.github.com` or a GitHub Enterprise API root).
    pub fn from_token(
        token: impl Into<String>,
        base_uri: &str,
    ) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .base_uri(base_uri)?
            .build()?;
        Ok(Self::new(client))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient").finish_non_exhaustive()
    }
}

impl GitHubClient for OctocrabClient {
    async fn get_pull_request_labels(
        &self,
        repo: &RepoId,
        number: PrNumber,
    ) -> Result<Vec<String>, GitHubApiError> {
        let pull = self
            .client
            .pulls(&repo.owner, &repo.repo)
            .get(number.0)
            .await
            .map_err(|e| {
                GitHubApiError::from_octocrab(format!("get pull request {repo}{number}"), e)
            })?;

        let labels: Vec<String> = pull
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|label| label.name)
            .collect();
        debug!(repo = %repo, pr = number.0, labels = ?labels, "Fetched pull request labels");
        Ok(labels)
    }

    async fn list_collaborators(&self, repo: &RepoId) -> Result<Vec<String>, GitHubApiError> {
        let context = || format!("list collaborators of {repo}");
        let route = format!("/repos/{}/{}/collaborators", repo.owner, repo.repo);

        let first: Page<RawCollaborator> = self
            .client
            .get(&route, Some(&PageParams { per_page: PER_PAGE }))
            .await
            .map_err(|e| GitHubApiError::from_octocrab(context(), e))?;
        let all = self
            .client
            .all_pages(first)
            .await
            .map_err(|e| GitHubApiError::from_octocrab(context(), e))?;

        debug!(repo = %repo, count = all.len(), "Fetched collaborators");
        Ok(all.into_iter().map(|c| c.login).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> OctocrabClient {
        OctocrabClient::from_token("test-token", &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn list_collaborators_returns_logins_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pingcap/tidb/collaborators"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "login": "alice", "id": 1 },
                { "login": "bob", "id": 2 }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let logins = client
            .list_collaborators(&RepoId::new("pingcap", "tidb"))
            .await
            .unwrap();
        assert_eq!(logins, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn api_failure_carries_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pingcap/tidb/collaborators"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .list_collaborators(&RepoId::new("pingcap", "tidb"))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
        assert!(err.message.contains("pingcap/tidb"));
    }
}
