//! GitHub API error type.

use std::fmt;
use thiserror::Error;

/// A failed GitHub API call.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    /// The HTTP status code, if the API answered at all.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Wraps an octocrab error, prefixing `context` to its message.
    pub fn from_octocrab(context: impl fmt::Display, err: octocrab::Error) -> Self {
        let status_code = match &err {
            octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
            _ => None,
        };
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => format!("{context}: {}", source.message),
            other => format!("{context}: {other}"),
        };
        Self {
            status_code,
            message,
            source: Some(err),
        }
    }

    /// An error that did not come from octocrab, such as one raised by a test
    /// double.
    pub fn without_source(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_when_known() {
        let err = GitHubApiError::without_source(Some(404), "get pull request: Not Found");
        assert_eq!(
            err.to_string(),
            "GitHub API error (HTTP 404): get pull request: Not Found"
        );
        assert!(err.is_not_found());

        let err = GitHubApiError::without_source(None, "connection reset");
        assert_eq!(err.to_string(), "GitHub API error: connection reset");
        assert!(!err.is_not_found());
    }
}
