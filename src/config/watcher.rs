//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched, not the file, so editors that save by
//! renaming a temp file over the config are still seen.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::bindings::BindingsRegistry;
use crate::config::loader::parse_config;
use crate::config::schema::ProxyConfig;

/// Watches the configuration file and publishes every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let mut reloader = Reloader::new(&self.path);
        let file_name = self.path.file_name().map(ToOwned::to_owned);
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(ToOwned::to_owned) == file_name);
                    if !ours {
                        return;
                    }
                    if let Some(config) = reloader.reload() {
                        let _ = tx.send(config);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Re-reads the config file, publishing only content that changed and validates.
struct Reloader {
    path: PathBuf,
    last: Option<String>,
}

impl Reloader {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            last: fs::read_to_string(path).ok(),
        }
    }

    fn reload(&mut self) -> Option<ProxyConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to read config, keeping current configuration");
                return None;
            }
        };

        if self.last.as_deref() == Some(content.as_str()) {
            tracing::debug!(path = ?self.path, "Config file touched without changes");
            return None;
        }

        let config = match parse_config(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                return None;
            }
        };

        let (registry, skipped) = BindingsRegistry::parse_with_report(&config.language.bindings);
        tracing::info!(
            path = ?self.path,
            bindings = registry.len(),
            skipped_lines = skipped.len(),
            enforce_domains = config.language.enforce_domains,
            "Config file changed, publishing reload"
        );

        self.last = Some(content);
        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "[upstream]\naddress = \"127.0.0.1:8080\"\n\n[language]\nbindings = \"en-GB=en.example.com\"\n";

    #[test]
    fn test_reload_publishes_only_changed_valid_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.toml");
        fs::write(&path, CONFIG).unwrap();

        let mut reloader = Reloader::new(&path);
        assert!(reloader.reload().is_none());

        fs::write(&path, CONFIG.replace("en.example.com", "uk.example.com")).unwrap();
        let config = reloader.reload().unwrap();
        assert_eq!(config.language.bindings, "en-GB=uk.example.com");
        assert!(reloader.reload().is_none());

        fs::write(&path, "[language]\nredirect_status = 200\n").unwrap();
        assert!(reloader.reload().is_none());
    }

    #[test]
    fn test_reload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let mut reloader = Reloader::new(&path);
        assert!(reloader.reload().is_none());

        fs::write(&path, CONFIG).unwrap();
        assert!(reloader.reload().is_some());
    }
}
