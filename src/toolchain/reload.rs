//! Live reload notification seam

use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the reload transport
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("reload transport failed: {0}")]
    Transport(String),
}

/// Tells connected dev clients that build artifacts changed
///
/// A real transport (a websocket broadcast, an SSE channel) plugs in
/// here; the shipped implementation only logs.
pub trait ReloadNotifier: Send + Sync {
    fn notify(&self, changed: &[PathBuf]) -> Result<(), ReloadError>;
}

/// Notifier that logs the changed artifacts
#[derive(Debug, Clone, Default)]
pub struct LogReloadNotifier;

impl ReloadNotifier for LogReloadNotifier {
    fn notify(&self, changed: &[PathBuf]) -> Result<(), ReloadError> {
        info!("Reload: {} artifact(s) changed", changed.len());
        for path in changed {
            debug!("  changed: {}", path.display());
        }
        Ok(())
    }
}
