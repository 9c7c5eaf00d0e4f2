// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debounced watcher for the animation document.
//!
//! The debouncer runs on its own thread and hands changes to the frame loop
//! through a channel that is polled once per frame.

use notify_debouncer_full::{
    new_debouncer,
    notify::{EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

/// Change to the watched file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The file was written or recreated
    Changed(PathBuf),
    /// The file was removed
    Removed(PathBuf),
    /// The watcher reported an error
    Error(String),
}

/// Watches one file through its parent directory
pub struct AnimationWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    event_rx: Receiver<WatchEvent>,
    path: PathBuf,
}

impl AnimationWatcher {
    /// Start watching `path`
    pub fn new(path: &Path, debounce: Duration) -> Result<Self, notify::Error> {
        let path = path.canonicalize().map_err(notify::Error::io)?;
        let dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let (event_tx, event_rx) = mpsc::channel();
        let target = path.clone();

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        if !event.paths.iter().any(|p| *p == target) {
                            continue;
                        }
                        let message = match event.kind {
                            EventKind::Create(_) | EventKind::Modify(_) => {
                                WatchEvent::Changed(target.clone())
                            }
                            EventKind::Remove(_) => WatchEvent::Removed(target.clone()),
                            EventKind::Any | EventKind::Access(_) | EventKind::Other => continue,
                        };
                        let _ = event_tx.send(message);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let _ = event_tx.send(WatchEvent::Error(error.to_string()));
                    }
                }
            }
        })?;

        debouncer.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching {} for changes", path.display());

        Ok(Self {
            _debouncer: debouncer,
            event_rx,
            path,
        })
    }

    /// Watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending events (non-blocking)
    pub fn poll_events(&self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("File watcher channel disconnected");
                    break;
                }
            }
        }
        events
    }

    /// Whether the file changed since the last poll; removal and errors are logged
    pub fn take_changed(&self) -> bool {
        let mut changed = false;
        for event in self.poll_events() {
            match event {
                WatchEvent::Changed(_) => changed = true,
                WatchEvent::Removed(path) => {
                    tracing::warn!("Animation file {} was removed", path.display());
                }
                WatchEvent::Error(message) => tracing::warn!("File watcher error: {message}"),
            }
        }
        changed
    }
}
