use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use review_plugins::config::ConfigStore;
use review_plugins::github::OctocrabClient;
use review_plugins::owners::{OwnersService, SigDirectory, sig};
use review_plugins::server::{AppState, build_router};
use review_plugins::webhooks::{EventHandlers, WebhookSecret};

/// Webhook and owners server for code-review plugins
#[derive(Parser, Debug)]
#[command(name = "review-plugins")]
#[command(version, about, long_about = None)]
struct Options {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Path to the plugin policy document
    #[arg(
        long,
        env = "EXTERNAL_PLUGINS_CONFIG",
        default_value = "/etc/external_plugins_config/external_plugins_config.yaml"
    )]
    external_plugins_config: PathBuf,

    /// Seconds between checks of the policy document for changes
    #[arg(long, env = "CONFIG_RELOAD_SECS", default_value_t = 60)]
    config_reload_secs: u64,

    /// Path to the file containing the GitHub HMAC secret
    #[arg(long, env = "HMAC_SECRET_FILE", default_value = "/etc/webhook/hmac")]
    hmac_secret_file: PathBuf,

    /// Path to the file containing the GitHub OAuth token
    #[arg(long, env = "GITHUB_TOKEN_PATH", default_value = "/etc/github/oauth")]
    github_token_path: PathBuf,

    /// GitHub API endpoint
    #[arg(long, env = "GITHUB_ENDPOINT", default_value = "https://api.github.com")]
    github_endpoint: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "review_plugins=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Reads a secret file, dropping trailing whitespace left by editors and
/// secret mounts.
async fn read_secret(path: &Path) -> Result<String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Error reading secret from {}", path.display()))?;
    Ok(raw.trim_end().to_string())
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = shutdown.cancelled() => return,
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::parse();
    init_tracing(options.log_json);

    let webhook_secret = read_secret(&options.hmac_secret_file).await?;
    let github_token = read_secret(&options.github_token_path).await?;

    let config = ConfigStore::load(&options.external_plugins_config)
        .await
        .with_context(|| {
            format!(
                "Error loading external plugin config from {}",
                options.external_plugins_config.display()
            )
        })?;
    let config = Arc::new(config);

    let github = OctocrabClient::from_token(github_token, &options.github_endpoint)
        .context("Error getting GitHub client")?;
    let sigs = SigDirectory::new(sig::DEFAULT_TIMEOUT).context("Error building SIG client")?;

    let shutdown = CancellationToken::new();
    let reload = config.clone().spawn_reload_loop(
        Duration::from_secs(options.config_reload_secs),
        shutdown.clone(),
    );
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let app_state = AppState::new(
        WebhookSecret::new(webhook_secret),
        EventHandlers::new(),
        config,
        OwnersService::new(github, sigs),
    );
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], options.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Error binding {addr}"))?;
    info!(%addr, "Listening");

    let serve_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { serve_shutdown.cancelled().await })
        .await
        .context("Server error")?;

    // The server can also stop on its own; make sure the reload loop follows.
    shutdown.cancel();
    if let Err(e) = reload.await {
        warn!(error = %e, "Config reload loop ended abnormally");
    }
    info!("Server stopped");
    Ok(())
}
