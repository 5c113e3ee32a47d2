//! Watch session state - at most one dev server per session

use crate::toolchain::server::{ServeError, ServerHandle};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Dev server lifecycle within a session
///
/// Moves one way only: `NotStarted` to `Started` on the first development
/// build, `Started` (or `NotStarted`) to `Stopped` on shutdown. A stopped
/// session never spawns again.
pub enum ServerState {
    /// No build has spawned the server yet
    NotStarted,
    /// The server is running; the handle owns the process
    Started(Box<dyn ServerHandle>),
    /// The session was shut down
    Stopped,
}

impl fmt::Debug for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::NotStarted => write!(f, "NotStarted"),
            ServerState::Started(handle) => write!(f, "Started(pid: {:?})", handle.id()),
            ServerState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// State that outlives individual builds within one watch run
///
/// The orchestrator consults the session to decide whether the serve step
/// may spawn the dev server. One-shot builds use a fresh session, so a
/// development one-shot still gets a server; repeated builds in a watch
/// loop share the session and spawn at most once.
#[derive(Debug)]
pub struct WatchSession {
    /// Unique id of this session
    pub session_id: Uuid,

    /// Builds that ran to completion in this session
    pub builds_completed: usize,

    server: ServerState,
}

impl WatchSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            builds_completed: 0,
            server: ServerState::NotStarted,
        }
    }

    /// Whether the dev server is currently running
    pub fn server_started(&self) -> bool {
        matches!(self.server, ServerState::Started(_))
    }

    /// Whether the session has been shut down
    pub fn server_stopped(&self) -> bool {
        matches!(self.server, ServerState::Stopped)
    }

    /// Whether the serve step may spawn the server
    pub fn can_start_server(&self) -> bool {
        matches!(self.server, ServerState::NotStarted)
    }

    /// Process id of the running server, if any
    pub fn server_pid(&self) -> Option<u32> {
        match &self.server {
            ServerState::Started(handle) => handle.id(),
            _ => None,
        }
    }

    /// Hand a freshly spawned server to the session
    ///
    /// Ignored unless the session is in `NotStarted`; dropping the handle
    /// reclaims the stray process.
    pub fn attach_server(&mut self, handle: Box<dyn ServerHandle>) {
        match self.server {
            ServerState::NotStarted => {
                debug!(session_id = %self.session_id, pid = ?handle.id(), "Dev server attached to session");
                self.server = ServerState::Started(handle);
            }
            _ => {
                warn!(
                    session_id = %self.session_id,
                    state = ?self.server,
                    "Refusing to attach a second dev server"
                );
            }
        }
    }

    /// Count a build that ran to completion
    pub fn record_build(&mut self) {
        self.builds_completed += 1;
    }

    /// Stop the session, killing the dev server if it is running
    ///
    /// The session ends in `Stopped` regardless of the prior state, so
    /// later builds through the same session will not respawn.
    pub async fn shutdown(&mut self) -> Result<(), ServeError> {
        let previous = std::mem::replace(&mut self.server, ServerState::Stopped);
        if let ServerState::Started(mut handle) = previous {
            debug!(session_id = %self.session_id, pid = ?handle.id(), "Stopping dev server");
            handle.shutdown().await?;
        }
        Ok(())
    }
}

impl Default for WatchSession {
    fn default() -> Self {
        Self::new()
    }
}
