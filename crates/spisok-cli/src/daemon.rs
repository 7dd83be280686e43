//! Long-running scheduler process
//!
//! Owns the job queue and fire handler, rebuilds every job from the store at
//! startup and reconciles whenever the store file changes on disk.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use spisok_channels::create_notifier;
use spisok_scheduler::{FireHandler, ReminderStore, Scheduler, Snapshot, TokioJobQueue, reconcile};
use spisok_store::JsonReminderStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;

/// Editors write the store in bursts (temp file, then rename).
const DEBOUNCE: Duration = Duration::from_millis(200);

pub async fn run(config: &Config, store_path: &Path) -> Result<()> {
    let store = Arc::new(JsonReminderStore::open(store_path));
    let (queue, fired_rx) = TokioJobQueue::new(Handle::current(), config.queue_buffer);
    let queue = Arc::new(queue);
    let scheduler = Arc::new(Scheduler::new(queue.clone()));
    let handler = FireHandler::new(scheduler.clone(), store.clone(), create_notifier(config.notifier));

    let mut current = match store.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Failed to read reminders, starting empty: {:#}", e);
            Snapshot::default()
        }
    };
    let scheduled = scheduler.reschedule_all(&current.reminders, current.global_enabled);
    info!(
        "Scheduled {} job(s) for {} reminder(s) from {:?}",
        scheduled,
        current.reminders.len(),
        store_path
    );

    let fire_task = tokio::spawn(async move { handler.run(fired_rx).await });

    let (change_tx, mut change_rx) = mpsc::channel::<()>(16);
    let _watcher = watch_store(store_path, change_tx)?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutting down");
                break;
            }
            changed = change_rx.recv() => {
                if changed.is_none() {
                    warn!("Store watcher stopped");
                    break;
                }
                tokio::time::sleep(DEBOUNCE).await;
                while change_rx.try_recv().is_ok() {}

                match store.snapshot() {
                    Ok(next) => {
                        let report = reconcile(&scheduler, &current, &next);
                        info!(
                            "Store changed: {} job(s) scheduled, {} reminder(s) cancelled{}",
                            report.scheduled,
                            report.cancelled,
                            if report.full_flush { " (full rebuild)" } else { "" }
                        );
                        current = next;
                    }
                    Err(e) => warn!("Store unreadable, keeping current jobs: {:#}", e),
                }
            }
        }
    }

    queue.shutdown();
    fire_task.abort();
    Ok(())
}

/// Watch the store's directory and signal `tx` on any change to the store
/// file itself. The directory is watched so atomic replaces are seen.
fn watch_store(store_path: &Path, tx: mpsc::Sender<()>) -> Result<notify::RecommendedWatcher> {
    let dir = match store_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let file_name = store_path.file_name().map(|name| name.to_os_string());
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let touches_store = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if touches_store {
                debug!("Store event: {:?}", event.kind);
                // A full channel already holds a pending signal.
                let _ = tx.try_send(());
            }
        }
        Err(e) => warn!("Store watch error: {}", e),
    })
    .context("Failed to create store watcher")?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;
    info!("Watching {:?} for changes", store_path);
    Ok(watcher)
}
