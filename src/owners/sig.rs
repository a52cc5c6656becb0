//! Client for the SIG membership directory.
//!
//! The directory answers `GET {endpoint}/sigs/{name}` with
//!
//! ```json
//! { "data": { "needs_lgtm": 2,
//!             "membership": { "tech_leaders": [{ "github_name": "carol" }], ... } } }
//! ```

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

use super::OwnersError;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SigResponse {
    pub data: SigInfo,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SigInfo {
    pub name: String,
    pub membership: Membership,
    pub needs_lgtm: u32,
}

/// Members of a SIG by role. Roles absent from the payload are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Membership {
    pub tech_leaders: Vec<Member>,
    pub co_leaders: Vec<Member>,
    pub committers: Vec<Member>,
    pub reviewers: Vec<Member>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Member {
    pub github_name: String,
}

/// Builds the directory URL for a SIG, ignoring one trailing `/` on the
/// endpoint.
pub fn sig_url(endpoint: &str, sig_name: &str) -> String {
    let base = endpoint.strip_suffix('/').unwrap_or(endpoint);
    format!("{base}/sigs/{sig_name}")
}

#[derive(Debug, Clone)]
pub struct SigDirectory {
    client: Client,
}

impl SigDirectory {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetches a SIG's membership. Any non-200 answer is an error.
    pub async fn fetch(&self, endpoint: &str, sig_name: &str) -> Result<SigInfo, OwnersError> {
        let url = sig_url(endpoint, sig_name);
        debug!(url = %url, "Fetching SIG info");

        let response = self.client.get(&url).send().await.map_err(|source| {
            error!(url = %url, error = %source, "Failed to get SIG info");
            OwnersError::SigRequest {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(url = %url, status = status.as_u16(), "Failed to get SIG info");
            return Err(OwnersError::SigStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| OwnersError::SigRequest {
                url: url.clone(),
                source,
            })?;
        let parsed: SigResponse = serde_json::from_slice(&body).map_err(|source| {
            error!(
                url = %url,
                body = %String::from_utf8_lossy(&body),
                error = %source,
                "Failed to decode SIG info"
            );
            OwnersError::SigBody {
                url: url.clone(),
                source,
            }
        })?;
        Ok(parsed.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn sig_url_trims_exactly_one_trailing_slash() {
        assert_eq!(sig_url("https://bots.example", "ddl"), "https://bots.example/sigs/ddl");
        assert_eq!(sig_url("https://bots.example/", "ddl"), "https://bots.example/sigs/ddl");
        assert_eq!(
            sig_url("https://bots.example/api//", "ddl"),
            "https://bots.example/api//sigs/ddl"
        );
    }

    #[test]
    fn missing_roles_and_quorum_default() {
        let parsed: SigResponse =
            serde_json::from_str(r#"{"data": {"membership": {"committers": [{"github_name": "x"}]}}}"#)
                .unwrap();
        assert_eq!(parsed.data.needs_lgtm, 0);
        assert!(parsed.data.membership.tech_leaders.is_empty());
        assert_eq!(parsed.data.membership.committers[0].github_name, "x");
    }

    #[test]
    fn missing_data_is_malformed() {
        assert!(serde_json::from_str::<SigResponse>(r#"{"message": "ok"}"#).is_err());
    }

    #[tokio::test]
    async fn fetch_reads_membership() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sigs/planner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "name": "planner",
                    "needs_lgtm": 2,
                    "membership": {
                        "tech_leaders": [{ "github_name": "carol" }],
                        "reviewers": [{ "github_name": "dan" }]
                    }
                },
                "message": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let directory = SigDirectory::new(DEFAULT_TIMEOUT).unwrap();
        let info = directory
            .fetch(&format!("{}/", server.uri()), "planner")
            .await
            .unwrap();
        assert_eq!(info.name, "planner");
        assert_eq!(info.needs_lgtm, 2);
        assert_eq!(info.membership.tech_leaders[0].github_name, "carol");
        assert_eq!(info.membership.reviewers[0].github_name, "dan");
    }

    #[tokio::test]
    async fn fetch_rejects_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sigs/planner"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let directory = SigDirectory::new(DEFAULT_TIMEOUT).unwrap();
        let err = directory.fetch(&server.uri(), "planner").await.unwrap_err();
        assert!(matches!(err, OwnersError::SigStatus { status: 204, .. }));
    }

    #[tokio::test]
    async fn fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": {} }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let directory = SigDirectory::new(Duration::from_millis(100)).unwrap();
        let err = directory.fetch(&server.uri(), "planner").await.unwrap_err();
        assert!(matches!(err, OwnersError::SigRequest { .. }));
    }
}
