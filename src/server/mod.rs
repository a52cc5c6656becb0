//! HTTP server for the review plugins.
//!
//! # Endpoints
//!
//! - `POST /hook` - Accepts GitHub webhook deliveries and dispatches them
//! - `GET /repos/{org}/{repo}/pulls/{number}/owners` - Lists a pull request's owners
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

pub mod health;
pub mod owners;
pub mod webhook;

pub use health::health_handler;
pub use owners::owners_handler;
pub use webhook::{WebhookError, webhook_handler};

use crate::config::ConfigStore;
use crate::github::GitHubClient;
use crate::owners::OwnersService;
use crate::webhooks::{EventHandlers, WebhookSecret};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<G> {
    inner: Arc<AppStateInner<G>>,
}

struct AppStateInner<G> {
    webhook_secret: WebhookSecret,
    handlers: EventHandlers,
    config: Arc<ConfigStore>,
    owners: OwnersService<G>,
}

// Derived `Clone` would require `G: Clone`.
impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: GitHubClient> AppState<G> {
    pub fn new(
        webhook_secret: WebhookSecret,
        handlers: EventHandlers,
        config: Arc<ConfigStore>,
        owners: OwnersService<G>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret,
                handlers,
                config,
                owners,
            }),
        }
    }

    pub fn webhook_secret(&self) -> &WebhookSecret {
        &self.inner.webhook_secret
    }

    pub fn handlers(&self) -> &EventHandlers {
        &self.inner.handlers
    }

    pub fn config(&self) -> &ConfigStore {
        &self.inner.config
    }

    pub fn owners(&self) -> &OwnersService<G> {
        &self.inner.owners
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G: GitHubClient>(app_state: AppState<G>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/hook", post(webhook_handler::<G>))
        .route(
            "/repos/{org}/{repo}/pulls/{number}/owners",
            get(owners_handler::<G>),
        )
        .route("/health", get(health_handler))
        .with_state(app_state)
}
