//! Configuration and Shader Hot-Reload
//!
//! Watches config.toml and the files of the selected shader, sending events
//! through a channel for the front end to handle.

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::{Config, ConfigError};

/// Events emitted by the shader watcher
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Configuration file changed, contains new config
    ConfigChanged(Config),
    /// A manifest or pass source of the shader changed
    ShaderChanged(PathBuf),
    /// Error occurred while reloading or watching
    WatchError(String),
}

/// Watches the configuration file and shader files for changes
pub struct ShaderWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<WatchEvent>,
    shader_paths: Vec<PathBuf>,
}

impl ShaderWatcher {
    /// Create a new watcher
    ///
    /// `config_file` is reloaded on change; every path in `shader_paths`
    /// produces `ShaderChanged`. Parent directories are watched so that
    /// editors replacing files on save are still noticed.
    pub fn new(
        config_file: Option<PathBuf>,
        shader_paths: &[PathBuf],
        debounce: Duration,
    ) -> Result<Self, ConfigError> {
        let (tx, rx) = mpsc::channel();

        let config_file = config_file.map(|p| canonical(&p));
        let shader_paths: Vec<PathBuf> = shader_paths.iter().map(|p| canonical(p)).collect();

        let config_file_clone = config_file.clone();
        let shader_paths_clone = shader_paths.clone();

        // Track last event times per file for debouncing
        let mut last_events: HashMap<PathBuf, Instant> = HashMap::new();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    // Only handle writes and replacements
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }

                    for path in &event.paths {
                        let is_config = config_file_clone.as_ref() == Some(path);
                        let is_shader = shader_paths_clone.contains(path);
                        if !is_config && !is_shader {
                            continue;
                        }

                        // Debounce
                        let now = Instant::now();
                        if let Some(last) = last_events.get(path) {
                            if now.duration_since(*last) < debounce {
                                continue;
                            }
                        }
                        last_events.insert(path.clone(), now);

                        if is_config {
                            log::info!("Config file changed, reloading...");
                            match Config::load_from(path) {
                                Ok(new_config) => {
                                    let _ = tx.send(WatchEvent::ConfigChanged(new_config));
                                }
                                Err(e) => {
                                    log::error!("Failed to reload config: {}", e);
                                    let _ = tx.send(WatchEvent::WatchError(e.to_string()));
                                }
                            }
                        } else {
                            log::info!("Shader file changed: {:?}", path);
                            let _ = tx.send(WatchEvent::ShaderChanged(path.clone()));
                        }
                    }
                }
                Err(e) => {
                    log::error!("Watch error: {:?}", e);
                    let _ = tx.send(WatchEvent::WatchError(e.to_string()));
                }
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(1)),
        )
        .map_err(|e| ConfigError::WatchError(e.to_string()))?;

        let dirs: BTreeSet<PathBuf> = config_file
            .iter()
            .chain(shader_paths.iter())
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();

        for dir in &dirs {
            if !dir.exists() {
                log::warn!("Not watching missing directory {:?}", dir);
                continue;
            }
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| ConfigError::WatchError(e.to_string()))?;
            log::info!("Watching directory: {:?}", dir);
        }

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            shader_paths,
        })
    }

    /// Shader files this watcher reports on
    pub fn shader_paths(&self) -> &[PathBuf] {
        &self.shader_paths
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<WatchEvent> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    ///
    /// Returns `None` on timeout or when the watcher thread is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WatchEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Watcher channel disconnected");
                None
            }
        }
    }

    /// Get all pending events
    pub fn drain_events(&self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
