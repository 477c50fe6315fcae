//! Source watching and rebuilds.
//!
//! ```text
//! notify ──► Debouncer (timing, filtering) ──► rebuild ──► WatchStatus
//! ```
//!
//! The watcher is installed before the initial build so no edit made
//! during it is lost. Every rebuild reloads `kiln.toml`, so config edits
//! take effect without a restart.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam::channel::{self, Receiver};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use crate::cli::Cli;
use crate::cli::build::{build_assets, summarize};
use crate::config::BundleConfig;
use crate::core::{begin_update, end_update, set_healthy};
use crate::logger::{status_error, status_success};

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

/// Collects changed paths until the burst settles.
struct Debouncer {
    root: PathBuf,
    output: PathBuf,
    changes: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_build: Option<Instant>,
}

impl Debouncer {
    fn new(root: PathBuf, output: PathBuf) -> Self {
        Self {
            root,
            output,
            changes: FxHashSet::default(),
            last_event: None,
            last_build: None,
        }
    }

    fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // mtime/chmod noise would loop on our own commits
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        for path in &event.paths {
            if self.is_ignored(path) {
                continue;
            }
            crate::debug!("watch"; "{:?} {}", event.kind, path.display());
            self.changes.insert(path.clone());
            self.last_event = Some(Instant::now());
        }
    }

    /// Output files, hidden paths (staging dirs, VCS) and editor backups.
    fn is_ignored(&self, path: &Path) -> bool {
        if path.starts_with(&self.output) {
            return true;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let hidden = relative
            .components()
            .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')));
        hidden || is_temp_file(path)
    }

    fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }
        if let Some(last_build) = self.last_build
            && last_build.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }
        !self.changes.is_empty()
    }

    fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        self.last_build = Some(Instant::now());
        let mut changes: Vec<_> = self.changes.drain().collect();
        changes.sort();
        Some(changes)
    }

    /// Time until the pending burst could be ready.
    fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(3600);
        };
        let debounce = Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());
        let cooldown = self
            .last_build
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);
        debounce.max(cooldown).max(Duration::from_millis(1))
    }
}

fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext, "bak" | "swp" | "swo" | "tmp") || name.ends_with('~')
}

/// Watch the project root and rebuild on change until shutdown.
pub fn spawn(cli: Cli, config: &BundleConfig, shutdown_rx: Receiver<()>) -> Result<JoinHandle<()>> {
    let (event_tx, event_rx) = channel::unbounded();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = event_tx.send(res);
    })?;
    watcher.watch(&config.root, RecursiveMode::Recursive)?;
    crate::debug!("watch"; "watching {}", config.root.display());

    let mut debouncer = Debouncer::new(config.root.clone(), config.output_dir());
    Ok(thread::spawn(move || {
        // moved in so it lives as long as the loop
        let _watcher = watcher;
        loop {
            channel::select! {
                recv(event_rx) -> msg => match msg {
                    Ok(Ok(event)) => debouncer.add_event(&event),
                    Ok(Err(err)) => crate::log!("watch"; "notify error: {}", err),
                    Err(_) => break,
                },
                recv(shutdown_rx) -> _ => break,
                default(debouncer.sleep_duration()) => {}
            }

            if let Some(changes) = debouncer.take_if_ready()
                && let Some(output) = rebuild(&cli, &changes)
            {
                debouncer.output = output;
            }
        }
        crate::debug!("watch"; "stopped");
    }))
}

/// Reload config and rebuild. Returns the (possibly changed) output root.
fn rebuild(cli: &Cli, changes: &[PathBuf]) -> Option<PathBuf> {
    crate::debug!("watch"; "{} changed", crate::utils::plural::plural_count(changes.len(), "path"));

    begin_update();
    let result = BundleConfig::load(cli).and_then(|config| {
        build_assets(&config, true).map(|report| (config.output_dir(), report))
    });
    end_update();

    match result {
        Ok((output, report)) => {
            set_healthy(true);
            status_success(&summarize(&report));
            Some(output)
        }
        Err(err) => {
            set_healthy(false);
            status_error("build failed", &format!("{err:#}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, EventKind, MetadataKind, ModifyKind};

    fn debouncer() -> Debouncer {
        Debouncer::new(PathBuf::from("/site"), PathBuf::from("/site/dist"))
    }

    fn modify(path: &str) -> notify::Event {
        notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from(path))
    }

    #[test]
    fn test_ignores_output_hidden_and_backup_paths() {
        let mut d = debouncer();
        d.add_event(&modify("/site/dist/main.js"));
        d.add_event(&modify("/site/.kiln-staging-x/main.js"));
        d.add_event(&modify("/site/.git/index"));
        d.add_event(&modify("/site/src/site.js~"));
        d.add_event(&modify("/site/src/site.js.swp"));
        assert!(d.changes.is_empty());
        assert!(d.last_event.is_none());

        d.add_event(&modify("/site/src/site.js"));
        assert_eq!(d.changes.len(), 1);
    }

    #[test]
    fn test_ignores_metadata_changes() {
        let mut d = debouncer();
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::WriteTime,
        )))
        .add_path(PathBuf::from("/site/src/a.css"));
        d.add_event(&event);
        assert!(d.changes.is_empty());
    }

    #[test]
    fn test_ready_after_debounce() {
        let mut d = debouncer();
        d.add_event(
            &notify::Event::new(EventKind::Create(CreateKind::File))
                .add_path(PathBuf::from("/site/src/b.css")),
        );
        d.add_event(&modify("/site/src/a.css"));
        d.add_event(&modify("/site/src/a.css"));
        assert!(d.take_if_ready().is_none());

        d.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 10));
        let changes = d.take_if_ready().unwrap();
        assert_eq!(
            changes,
            vec![PathBuf::from("/site/src/a.css"), PathBuf::from("/site/src/b.css")]
        );

        // cooldown blocks an immediate second rebuild
        d.add_event(&modify("/site/src/a.css"));
        d.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 10));
        assert!(d.take_if_ready().is_none());
        assert!(d.sleep_duration() > Duration::ZERO);
    }
}
