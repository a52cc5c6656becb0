//! Plugin policy configuration.
//!
//! The policy document maps each feature to an ordered list of blocks. Every
//! block is scoped by a `repos` list whose entries are either an organization
//! (`"pingcap"`) or a single repository (`"pingcap/tidb"`).
//!
//! ```yaml
//! lgtm:
//!   - repos: [pingcap/tidb]
//!     review_acts_as_lgtm: true
//!     pull_owners_url: https://bots.tidb.io/ti-community-owners
//! owners:
//!   - repos: [pingcap]
//!     sig_endpoint: https://bots.tidb.io/ti-community-bot
//! ```
//!
//! # Resolution
//!
//! [`resolve`] makes two passes over a feature's blocks: the first block naming
//! `org/repo` exactly wins; failing that, the first block naming `org` wins;
//! failing that, the zero-valued block is returned. A repository-specific
//! block therefore beats an organization block regardless of which is listed
//! first.

pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use store::ConfigStore;

/// Errors raised while loading the policy document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML for [`Configuration`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A block carries a URL field that is not an absolute URL.
    #[error("invalid {field} {value:?} in {feature} block {index}: {reason}")]
    InvalidUrl {
        feature: &'static str,
        field: &'static str,
        index: usize,
        value: String,
        reason: String,
    },
}

/// A policy block that is scoped to organizations and repositories.
pub trait PolicyBlock: Clone + Default {
    /// Entries of the form `org` or `org/repo`.
    fn repos(&self) -> &[String];
}

/// Finds the block that applies to `org/repo`.
///
/// Returns the zero-valued block when nothing matches; callers treat that as
/// "feature disabled / defaults", never as an error.
///
/// ```
/// use review_plugins::config::{OwnersConfig, resolve};
///
/// let blocks = vec![
///     OwnersConfig { repos: vec!["pingcap".into()], sig_endpoint: "https://org.example".into() },
///     OwnersConfig { repos: vec!["pingcap/tidb".into()], sig_endpoint: "https://repo.example".into() },
/// ];
/// assert_eq!(resolve(&blocks, "pingcap", "tidb").sig_endpoint, "https://repo.example");
/// assert_eq!(resolve(&blocks, "pingcap", "tikv").sig_endpoint, "https://org.example");
/// assert_eq!(resolve(&blocks, "tikv", "tikv"), OwnersConfig::default());
/// ```
pub fn resolve<B: PolicyBlock>(blocks: &[B], org: &str, repo: &str) -> B {
    let full_name = format!("{org}/{repo}");
    blocks
        .iter()
        .find(|block| block.repos().iter().any(|r| *r == full_name))
        .or_else(|| {
            blocks
                .iter()
                .find(|block| block.repos().iter().any(|r| r == org))
        })
        .cloned()
        .unwrap_or_default()
}

/// Policy for the lgtm plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LgtmConfig {
    pub repos: Vec<String>,
    /// A GitHub "approve" or "request changes" review adds or removes the lgtm
    /// label.
    pub review_acts_as_lgtm: bool,
    /// Store the tree hash in a comment to detect squashed commits before
    /// removing lgtm labels.
    pub store_tree_hash: bool,
    /// Team whose members' lgtm survives minor follow-up pushes.
    #[serde(rename = "trusted_team_for_sticky_lgtm")]
    pub sticky_lgtm_team: String,
    /// Owners service queried for a pull request's reviewers.
    pub pull_owners_url: String,
}

impl PolicyBlock for LgtmConfig {
    fn repos(&self) -> &[String] {
        &self.repos
    }
}

/// Policy for the merge plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub repos: Vec<String>,
    pub store_tree_hash: bool,
    pub pull_owners_url: String,
}

impl PolicyBlock for MergeConfig {
    fn repos(&self) -> &[String] {
        &self.repos
    }
}

/// Policy for the owners service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnersConfig {
    pub repos: Vec<String>,
    /// Base URL of the SIG membership directory.
    pub sig_endpoint: String,
}

impl PolicyBlock for OwnersConfig {
    fn repos(&self) -> &[String] {
        &self.repos
    }
}

/// The whole policy document.
///
/// Feature sections are also accepted under their deployed
/// `ti-community-*` names. Any other top-level key is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    #[serde(alias = "ti-community-lgtm")]
    pub lgtm: Vec<LgtmConfig>,
    #[serde(alias = "ti-community-merge")]
    pub merge: Vec<MergeConfig>,
    #[serde(alias = "ti-community-owners")]
    pub owners: Vec<OwnersConfig>,
}

impl Configuration {
    /// Parses and validates a YAML policy document.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let config: Configuration = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn lgtm_for(&self, org: &str, repo: &str) -> LgtmConfig {
        resolve(&self.lgtm, org, repo)
    }

    pub fn merge_for(&self, org: &str, repo: &str) -> MergeConfig {
        resolve(&self.merge, org, repo)
    }

    pub fn owners_for(&self, org: &str, repo: &str) -> OwnersConfig {
        resolve(&self.owners, org, repo)
    }

    /// Checks that every URL-bearing block carries an absolute URL.
    ///
    /// The URL fields are mandatory: an empty value is rejected like any
    /// other non-URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, block) in self.lgtm.iter().enumerate() {
            validate_url("lgtm", "pull_owners_url", index, &block.pull_owners_url)?;
        }
        for (index, block) in self.merge.iter().enumerate() {
            validate_url("merge", "pull_owners_url", index, &block.pull_owners_url)?;
        }
        for (index, block) in self.owners.iter().enumerate() {
            validate_url("owners", "sig_endpoint", index, &block.sig_endpoint)?;
        }
        Ok(())
    }
}

fn validate_url(
    feature: &'static str,
    field: &'static str,
    index: usize,
    value: &str,
) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        feature,
        field,
        index,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL".to_string()));
    }
    Ok(())
}
