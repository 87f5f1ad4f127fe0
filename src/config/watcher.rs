//! Hot reload of the scheduler configuration file.
//!
//! A [`ConfigWatcher`] watches one YAML file and hands every successfully parsed and
//! validated revision to a callback, typically [`SchedulerFacade::reload`]. Invalid
//! revisions are logged and skipped; the previous tables stay in effect.
//!
//! [`SchedulerFacade::reload`]: crate::SchedulerFacade::reload

use super::SchedulerConfig;
use crate::{Error, ErrorContext, Result};
use notify::{
    Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Result as NotifyResult,
    Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Watches a configuration file for changes.
#[derive(Debug, Clone)]
pub struct ConfigWatcher {
    debounce: Duration,
}

impl Default for ConfigWatcher {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Keeps the watch alive; dropping it stops reloads.
pub struct WatcherHandle {
    stop_flag: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
    _watcher: RecommendedWatcher,
}

impl WatcherHandle {
    pub async fn stop(mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stop_flag.load(Ordering::SeqCst)
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl ConfigWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coalesce bursts of file events (editors often write several times per save).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching `path`. Must be called from within a tokio runtime.
    pub fn watch<P, F>(&self, path: P, on_change: F) -> Result<WatcherHandle>
    where
        P: AsRef<Path>,
        F: Fn(SchedulerConfig) + Send + Sync + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::channel::<()>(16);

        let mut watcher = RecommendedWatcher::new(
            move |res: NotifyResult<Event>| {
                if let Ok(event) = res {
                    if event.kind.is_modify() || event.kind.is_create() {
                        // A full channel already holds a pending reload.
                        let _ = tx.try_send(());
                    }
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| watch_error("failed to initialize file watcher", &path, e))?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error("failed to watch config file", &path, e))?;
        info!(path = %path.display(), "watching scheduler config");

        let debounce = self.debounce;
        let flag = stop_flag.clone();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                tokio::time::sleep(debounce).await;
                while rx.try_recv().is_ok() {}
                reload(&path, &on_change);
            }
            debug!(path = %path.display(), "config watcher stopped");
        });

        Ok(WatcherHandle {
            stop_flag,
            task: Some(task),
            _watcher: watcher,
        })
    }
}

fn reload<F: Fn(SchedulerConfig)>(path: &PathBuf, on_change: &F) {
    match SchedulerConfig::from_file(path) {
        Ok(cfg) => {
            info!(path = %path.display(), "scheduler config changed, reloading");
            on_change(cfg);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring invalid scheduler config revision");
        }
    }
}

fn watch_error(msg: &str, path: &Path, e: notify::Error) -> Error {
    Error::watcher_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(path.display().to_string())
            .with_details(e.to_string())
            .with_source("config_watcher"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn missing_file_is_a_watcher_error() {
        let err = ConfigWatcher::new()
            .watch("/definitely/not/here/scheduler.yaml", |_| {})
            .err()
            .expect("watching a missing path must fail");
        assert!(matches!(err, Error::Watcher { .. }));
    }

    #[tokio::test]
    async fn reload_skips_invalid_revision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.yaml");
        std::fs::write(&path, "stat:\n  shortWindowSeconds: -1\n").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        reload(&path, &move |cfg: SchedulerConfig| {
            sink.lock().unwrap().push(cfg.stat.key_prefix)
        });
        assert!(seen.lock().unwrap().is_empty());

        std::fs::write(&path, "stat:\n  keyPrefix: stat_v2\n").unwrap();
        let sink = seen.clone();
        reload(&path, &move |cfg: SchedulerConfig| {
            sink.lock().unwrap().push(cfg.stat.key_prefix)
        });
        assert_eq!(seen.lock().unwrap().as_slice(), ["stat_v2".to_string()]);
    }
}
