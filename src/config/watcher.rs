//! Config file watching for hot reload.
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: editors that save by
//!   writing a new file and renaming it over the old one replace the inode
//! - Events for sibling files are ignored
//! - A file that fails to load or validate is logged and skipped; the
//!   running rules stay in place

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::EdgeConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// What happened to one change of the watched file.
#[derive(Debug, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The new config was handed to the server.
    Sent,
    /// The file did not load or validate.
    Rejected,
    /// Nobody is listening for updates any more.
    ReceiverClosed,
}

/// Watches the edge config file and pushes every valid revision to the server.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<EdgeConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<EdgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching on notify's background thread.
    ///
    /// Events stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let dir = watch_dir(&path).to_path_buf();
        let watched = path.clone();
        let mut stopped = false;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if !stopped && touches(&event, &watched) => {
                    tracing::info!(path = %watched.display(), kind = ?event.kind, "Config file changed");
                    if reload(&watched, &update_tx) == ReloadOutcome::ReceiverClosed {
                        tracing::warn!(path = %watched.display(), "Server no longer accepts config updates; reloads stopped");
                        stopped = true;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(path = %watched.display(), error = %e, "Config watch error");
                }
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), dir = %dir.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Load the file and forward it if it is valid.
pub fn reload(path: &Path, update_tx: &mpsc::UnboundedSender<EdgeConfig>) -> ReloadOutcome {
    if update_tx.is_closed() {
        return ReloadOutcome::ReceiverClosed;
    }

    match load_config(path) {
        Ok(config) => match update_tx.send(config) {
            Ok(()) => ReloadOutcome::Sent,
            Err(_) => ReloadOutcome::ReceiverClosed,
        },
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Config reload rejected; keeping current rules");
            ReloadOutcome::Rejected
        }
    }
}

/// Whether an event is a write to (or replacement of) the watched file.
fn touches(event: &Event, path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = path.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}

fn watch_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|dir| dir.as_os_str() != OsStr::new(""))
        .unwrap_or(Path::new("."))
}
