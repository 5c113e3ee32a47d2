//! Dev server process management

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::debug;

/// Errors from launching or stopping the dev server
#[derive(Debug, Error)]
pub enum ServeError {
    /// The configured server command has no program
    #[error("dev server command is empty")]
    EmptyCommand,

    /// The server process could not be spawned
    #[error("failed to spawn dev server: {0}")]
    Spawn(#[source] std::io::Error),

    /// The browser could not be opened
    #[error("failed to open browser at {url}: {source}")]
    Browser {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Killing or reaping the server failed
    #[error("failed to stop dev server: {0}")]
    Shutdown(#[source] std::io::Error),
}

/// Handle to a running dev server
///
/// Owned by the watch session; dropping it reclaims the process.
#[async_trait]
pub trait ServerHandle: Send {
    /// OS process id, if known
    fn id(&self) -> Option<u32>;

    /// Kill the server and reap it
    async fn shutdown(&mut self) -> Result<(), ServeError>;
}

/// Spawns the dev server and opens the browser
pub trait ServerLauncher: Send + Sync {
    /// Spawn the server command
    ///
    /// The child gets no stdin and inherits stdout and stderr so its
    /// logs stay visible in the terminal.
    fn launch(&self, command: &[String]) -> Result<Box<dyn ServerHandle>, ServeError>;

    /// Open `url` in the default browser
    fn open_browser(&self, url: &str) -> Result<(), ServeError>;
}

/// Launcher backed by real OS processes
#[derive(Debug, Clone, Default)]
pub struct ProcessServerLauncher;

impl ServerLauncher for ProcessServerLauncher {
    fn launch(&self, command: &[String]) -> Result<Box<dyn ServerHandle>, ServeError> {
        let (program, args) = command.split_first().ok_or(ServeError::EmptyCommand)?;

        debug!("Spawning dev server: {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(ServeError::Spawn)?;

        let pid = child.id();
        Ok(Box::new(ProcessServerHandle { pid, child }))
    }

    fn open_browser(&self, url: &str) -> Result<(), ServeError> {
        debug!("Opening browser at {}", url);
        open::that_detached(url).map_err(|source| ServeError::Browser {
            url: url.to_string(),
            source,
        })
    }
}

/// Handle owning a spawned dev server process
#[derive(Debug)]
pub struct ProcessServerHandle {
    pid: Option<u32>,
    child: Child,
}

#[async_trait]
impl ServerHandle for ProcessServerHandle {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    async fn shutdown(&mut self) -> Result<(), ServeError> {
        // start_kill reports InvalidInput when the process already exited;
        // the wait below still reaps it.
        if let Err(source) = self.child.start_kill() {
            if source.kind() != std::io::ErrorKind::InvalidInput {
                return Err(ServeError::Shutdown(source));
            }
        }
        self.child.wait().await.map_err(ServeError::Shutdown)?;
        Ok(())
    }
}
