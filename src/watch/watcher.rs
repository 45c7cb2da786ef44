// src/watch/watcher.rs

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::errors::Result;
use crate::task::WatchRule;
use crate::watch::event_handler::ChangeFilter;
use crate::watch::patterns::{collect_matching_files, WatchProfile};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// `RuntimeEvent::TaskTriggered` for the rule's task whenever a matching
/// path changes.
///
/// Failing to create or attach the OS watcher is returned as
/// `TaskwatchError::WatchError`.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    rule: &WatchRule,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let profile = WatchProfile::from_rule(rule)?;

    let mut filter = ChangeFilter::new(root.clone(), profile.clone());
    if profile.use_hash() {
        match collect_matching_files(&root, &profile) {
            Ok(files) => filter = filter.with_primed_hashes(&files),
            Err(e) => warn!(rule = %rule.name, error = %e, "failed to seed content hashes"),
        }
    }

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("taskwatch: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("taskwatch: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(rule = %rule.name, task = %rule.task, "file watcher started on {:?}", root);

    tokio::spawn(run_event_loop(event_rx, filter, rule.debounce, runtime_tx));

    Ok(WatcherHandle { _inner: watcher })
}

/// Consume raw events and emit one trigger per debounce window.
///
/// The first relevant event opens a window of `debounce`; every event that
/// arrives before it closes is absorbed into the same trigger.
pub async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    mut filter: ChangeFilter,
    debounce: Duration,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let task = filter.profile().task().to_string();

    while let Some(event) = event_rx.recv().await {
        debug!(?event, "received notify event");

        if !filter.is_relevant(&event) {
            continue;
        }

        let deadline = Instant::now() + debounce;
        let mut absorbed = 0usize;
        loop {
            match timeout_at(deadline, event_rx.recv()).await {
                Ok(Some(event)) => {
                    if filter.is_relevant(&event) {
                        absorbed += 1;
                    }
                }
                // Channel closed or window elapsed.
                Ok(None) | Err(_) => break,
            }
        }

        debug!(task = %task, absorbed, "debounce window closed -> triggering task");

        if let Err(err) = runtime_tx
            .send(RuntimeEvent::TaskTriggered {
                task: task.clone(),
                reason: TriggerReason::FileWatch,
            })
            .await
        {
            warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
            // The runtime is gone; no point keeping the watcher loop alive.
            return;
        }
    }

    debug!("watcher event loop finished");
}
