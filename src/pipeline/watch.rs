//! Watch loop - rebuilds on source changes until interrupted

use crate::core::mode::BuildMode;
use crate::core::session::WatchSession;
use crate::pipeline::orchestrator::Orchestrator;
use crate::toolchain::ServeError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{error, info};
use walkdir::WalkDir;

/// Run development builds until Ctrl-C, rebuilding when sources change
///
/// Change detection is a polling mtime scan over the configured watch
/// paths. A detected change waits out the debounce window and rescans,
/// so a burst of saves produces one rebuild. A failed rebuild is logged
/// and the loop keeps watching; only Ctrl-C ends the session, stopping
/// the dev server on the way out.
pub async fn run_watch(
    orchestrator: &Orchestrator,
    session: &mut WatchSession,
) -> Result<(), ServeError> {
    let watch = orchestrator.config().watch.clone();
    let poll = Duration::from_millis(watch.poll_interval_ms);
    let debounce = Duration::from_millis(watch.debounce_ms);

    run_once(orchestrator, session).await;
    let mut snapshot = scan_sources(&watch.paths);

    info!(
        "Watching {} path(s), Ctrl-C stops the dev server and exits",
        watch.paths.len()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(session_id = %session.session_id, "Watch interrupted, shutting down");
                break;
            }
            _ = tokio::time::sleep(poll) => {
                let current = scan_sources(&watch.paths);
                if current == snapshot {
                    continue;
                }

                tokio::time::sleep(debounce).await;
                snapshot = scan_sources(&watch.paths);

                if watch.clear_screen {
                    let _ = console::Term::stdout().clear_screen();
                }
                run_once(orchestrator, session).await;
            }
        }
    }

    session.shutdown().await
}

async fn run_once(orchestrator: &Orchestrator, session: &mut WatchSession) {
    match orchestrator.run_build(BuildMode::Development, session).await {
        Ok(report) => {
            info!(
                build = session.builds_completed,
                steps = report.executed_count(),
                "Rebuild finished"
            );
        }
        Err(err) => {
            // Watch survives broken builds; the next save tries again.
            error!("Rebuild failed: {}", err);
        }
    }
}

/// Snapshot file mtimes under the watch paths
///
/// Missing paths contribute nothing; a watch path that appears later is
/// picked up on the next scan.
pub fn scan_sources(paths: &[PathBuf]) -> HashMap<PathBuf, SystemTime> {
    let mut snapshot = HashMap::new();
    for root in paths {
        scan_into(root, &mut snapshot);
    }
    snapshot
}

fn scan_into(root: &Path, snapshot: &mut HashMap<PathBuf, SystemTime>) {
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(metadata) = entry.metadata() {
            if let Ok(mtime) = metadata.modified() {
                snapshot.insert(entry.path().to_path_buf(), mtime);
            }
        }
    }
}
