//! Review Plugins - shared plumbing for GitHub code-review bots.
//!
//! This library provides webhook validation and demultiplexing, per-repository
//! policy resolution with hot reload, and the pull request owners service.

pub mod config;
pub mod github;
pub mod owners;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
