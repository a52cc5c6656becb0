//! Hot-reloadable holder for the current [`Configuration`].
//!
//! Readers take an `Arc` snapshot and keep it for as long as they need; a
//! reload swaps in a new snapshot without disturbing anyone holding the old
//! one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{ConfigError, Configuration};

#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    tx: watch::Sender<Arc<Configuration>>,
}

impl ConfigStore {
    /// Reads, parses, and validates the document at `path`.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = read_config(&path).await?;
        let (tx, _) = watch::channel(Arc::new(config));
        Ok(ConfigStore {
            path: Some(path),
            tx,
        })
    }

    /// A store that is not backed by a file. [`reload`](Self::reload) is a
    /// no-op.
    pub fn from_config(config: Configuration) -> Self {
        let (tx, _) = watch::channel(Arc::new(config));
        ConfigStore { path: None, tx }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The active snapshot.
    pub fn current(&self) -> Arc<Configuration> {
        self.tx.borrow().clone()
    }

    /// Re-reads the backing file and installs the result.
    ///
    /// On error the previous snapshot stays active.
    pub async fn reload(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let config = read_config(path).await?;
        self.tx.send_replace(Arc::new(config));
        Ok(())
    }

    /// Observes each snapshot as it is installed.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Configuration>> {
        self.tx.subscribe()
    }

    /// Polls the backing file's modification time every `interval` and
    /// reloads when it changes. Runs until `cancel` fires.
    pub fn spawn_reload_loop(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        // Sampled before spawning so that a change made right after this call
        // is still seen as a change.
        let initial = self
            .path
            .as_deref()
            .and_then(|path| std::fs::metadata(path).ok()?.modified().ok());

        tokio::spawn(async move {
            let Some(path) = self.path.clone() else {
                debug!("Config store has no backing file, reload loop not started");
                return;
            };

            let mut last_seen = initial;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(path = %path.display(), "Config reload loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let modified = modified_time(&path).await;
                if modified.is_none() {
                    warn!(path = %path.display(), "Cannot stat config file");
                    continue;
                }
                if modified == last_seen {
                    continue;
                }
                last_seen = modified;

                match self.reload().await {
                    Ok(()) => info!(path = %path.display(), "Reloaded config"),
                    Err(e) => error!(
                        path = %path.display(),
                        error = %e,
                        "Failed to reload config, keeping previous"
                    ),
                }
            }
        })
    }
}

async fn read_config(path: &Path) -> Result<Configuration, ConfigError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Configuration::from_yaml(&source)
}

async fn modified_time(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const INITIAL: &str = r#"
owners:
  - repos: [pingcap]
    sig_endpoint: https://first.example
"#;

    const UPDATED: &str = r#"
owners:
  - repos: [pingcap]
    sig_endpoint: https://second.example
"#;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn overwrite(path: &Path, contents: &str, bump: Duration) {
        std::fs::write(path, contents).unwrap();
        // Push the mtime forward so coarse filesystem clocks still see a change.
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() + bump)
            .unwrap();
    }

    fn endpoint(store: &ConfigStore) -> String {
        store.current().owners_for("pingcap", "tidb").sig_endpoint
    }

    #[tokio::test]
    async fn load_installs_parsed_document() {
        let file = write_config(INITIAL);
        let store = ConfigStore::load(file.path()).await.unwrap();
        assert_eq!(endpoint(&store), "https://first.example");
        assert_eq!(store.path(), Some(file.path()));
    }

    #[tokio::test]
    async fn load_fails_on_missing_file() {
        let err = ConfigStore::load("/nonexistent/plugins.yaml").await.unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[tokio::test]
    async fn load_fails_on_invalid_url() {
        let file = write_config("owners:\n  - repos: [pingcap]\n    sig_endpoint: nope\n");
        let err = ConfigStore::load(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn reload_installs_new_snapshot() {
        let file = write_config(INITIAL);
        let store = ConfigStore::load(file.path()).await.unwrap();
        let held = store.current();

        std::fs::write(file.path(), UPDATED).unwrap();
        store.reload().await.unwrap();

        assert_eq!(endpoint(&store), "https://second.example");
        // Earlier snapshots are unaffected.
        assert_eq!(
            held.owners_for("pingcap", "tidb").sig_endpoint,
            "https://first.example"
        );
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let file = write_config(INITIAL);
        let store = ConfigStore::load(file.path()).await.unwrap();

        std::fs::write(
            file.path(),
            "owners: [{repos: [pingcap], sig_endpoint: not a url}]",
        )
        .unwrap();
        assert!(matches!(
            store.reload().await,
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert_eq!(endpoint(&store), "https://first.example");

        std::fs::write(file.path(), "lgtm: {").unwrap();
        assert!(matches!(store.reload().await, Err(ConfigError::Parse(_))));
        assert_eq!(endpoint(&store), "https://first.example");
    }

    #[tokio::test]
    async fn subscribers_see_reloads() {
        let file = write_config(INITIAL);
        let store = ConfigStore::load(file.path()).await.unwrap();
        let mut rx = store.subscribe();

        std::fs::write(file.path(), UPDATED).unwrap();
        store.reload().await.unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(
            seen.owners_for("pingcap", "tidb").sig_endpoint,
            "https://second.example"
        );
    }

    #[tokio::test]
    async fn in_memory_store_reload_is_noop() {
        let store = ConfigStore::from_config(Configuration::default());
        store.reload().await.unwrap();
        assert_eq!(*store.current(), Configuration::default());
        assert!(store.path().is_none());
    }

    #[tokio::test]
    async fn reload_loop_picks_up_file_changes() {
        let file = write_config(INITIAL);
        let store = Arc::new(ConfigStore::load(file.path()).await.unwrap());
        let mut rx = store.subscribe();
        let cancel = CancellationToken::new();
        let handle = store
            .clone()
            .spawn_reload_loop(Duration::from_millis(10), cancel.clone());

        overwrite(file.path(), UPDATED, Duration::from_secs(5));

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("reload loop did not install the new config")
            .unwrap();
        assert_eq!(endpoint(&store), "https://second.example");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn reload_loop_keeps_snapshot_when_file_breaks() {
        let file = write_config(INITIAL);
        let store = Arc::new(ConfigStore::load(file.path()).await.unwrap());
        let cancel = CancellationToken::new();
        let handle = store
            .clone()
            .spawn_reload_loop(Duration::from_millis(10), cancel.clone());

        overwrite(file.path(), "owners: {", Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(endpoint(&store), "https://first.example");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn reload_loop_stops_on_cancel() {
        let file = write_config(INITIAL);
        let store = Arc::new(ConfigStore::load(file.path()).await.unwrap());
        let cancel = CancellationToken::new();
        let handle = store
            .clone()
            .spawn_reload_loop(Duration::from_secs(3600), cancel.clone());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should exit promptly")
            .unwrap();
    }
}
