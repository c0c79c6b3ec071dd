//! Options file watching for automatic reconfiguration.
//!
//! A change to the options file sends `SignalMessage::Reload` to the main
//! loop, which re-runs `Configure`. The running location source is not
//! touched; the new values apply from the next `Start`.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::common::constants::CONFIG_WATCH_DEBOUNCE_MS;
use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Watches a single options file and requests reloads when it changes.
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
    config_path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(signal_sender: Sender<SignalMessage>, config_path: PathBuf, debug_enabled: bool) -> Self {
        Self {
            signal_sender,
            debug_enabled,
            config_path,
        }
    }

    /// Spawn the watcher thread.
    ///
    /// The parent directory is watched rather than the file itself so that
    /// editors replacing the file through a rename are still noticed.
    pub fn start(self) -> Result<()> {
        let watch_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .context("Config path has no parent directory")?;

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&watch_dir)))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching configuration for changes:");
            log_indented!("{}", private_path(&self.config_path));
        }

        thread::Builder::new()
            .name("locatr-config-watch".into())
            .spawn(move || {
                // The watcher stops when dropped, so it lives on this thread
                let _watcher = watcher;
                let mut last_reload: Option<Instant> = None;

                for event in rx {
                    if !affects_file(&event, &self.config_path) {
                        continue;
                    }

                    if last_reload.is_some_and(|last| {
                        last.elapsed() < Duration::from_millis(CONFIG_WATCH_DEBOUNCE_MS)
                    }) {
                        continue;
                    }

                    if self.debug_enabled {
                        log_pipe!();
                        log_info!("Configuration file change detected");
                    }

                    if self.signal_sender.send(SignalMessage::Reload).is_err() {
                        // Main loop is gone
                        break;
                    }
                    last_reload = Some(Instant::now());
                }
            })
            .context("Failed to spawn config watcher thread")?;

        Ok(())
    }
}

fn affects_file(event: &Event, config_path: &Path) -> bool {
    let Some(watched_name) = config_path.file_name() else {
        return false;
    };

    event.paths.iter().any(|path| {
        path == config_path
            || path
                .file_name()
                .and_then(|name| name.to_str())
                .zip(watched_name.to_str())
                .is_some_and(|(name, watched)| name.starts_with(watched))
    })
}

/// Start watching the options file at `config_path`.
pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(signal_sender, config_path, debug_enabled).start()
}
