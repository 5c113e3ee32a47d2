//! External toolchain seams - compiler commands, dev server, reload transport

pub mod reload;
pub mod server;
pub mod subprocess;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub use reload::{LogReloadNotifier, ReloadError, ReloadNotifier};
pub use server::{ProcessServerLauncher, ServeError, ServerHandle, ServerLauncher};
pub use subprocess::CommandToolchain;

/// A compiled module flowing through the transforming steps
///
/// Produced by compile and replaced by each transforming step that runs
/// after it. Doubles as the wire format of the compile command's JSON
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledModule {
    /// The module script
    pub script: String,

    /// Styles extracted during compilation, if any
    #[serde(default)]
    pub styles: Option<String>,

    /// Source map for the script, if the compiler produced one
    #[serde(default, rename = "map")]
    pub source_map: Option<String>,
}

/// Options for the compile operation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Enable runtime checks in the compiled output (development builds)
    pub dev_checks: bool,

    /// Module format of the output (e.g. `iife`)
    pub module_format: String,

    /// Global variable the bundle binds itself to
    pub global_name: String,

    /// Ask the compiler for a source map
    pub emit_source_map: bool,
}

/// Options for the resolve operation
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Prefer browser variants of packages
    pub browser: bool,

    /// Packages that must resolve to a single copy
    pub dedupe: Vec<String>,
}

/// Errors from toolchain commands
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// No command is configured for the operation
    #[error("no `{op}` command is configured")]
    MissingCommand { op: &'static str },

    /// The command could not be spawned
    #[error("failed to spawn `{op}` command: {source}")]
    Spawn {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// I/O with the running command failed
    #[error("`{op}` i/o failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a non-zero status
    #[error("`{op}` exited with code {code}: {stderr}")]
    CommandFailed {
        op: &'static str,
        code: i32,
        stderr: String,
    },

    /// The command ran past the configured timeout
    #[error("`{op}` timed out after {secs} seconds")]
    Timeout { op: &'static str, secs: u64 },

    /// The command succeeded but its output was unusable
    #[error("`{op}` produced invalid output: {reason}")]
    InvalidOutput { op: &'static str, reason: String },
}

/// The compiler toolchain the transforming steps call into
///
/// The shipped implementation runs configured commands as subprocesses;
/// tests substitute mocks.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Compile the entry module into a script plus extracted styles
    async fn compile(
        &self,
        entry: &Path,
        options: &CompileOptions,
    ) -> Result<CompiledModule, ToolchainError>;

    /// Resolve bare imports against installed packages
    async fn resolve(
        &self,
        module: CompiledModule,
        options: &ResolveOptions,
    ) -> Result<CompiledModule, ToolchainError>;

    /// Flatten legacy module wrappers into plain modules
    async fn flatten(&self, module: CompiledModule) -> Result<CompiledModule, ToolchainError>;

    /// Minify the script for production
    async fn minify(&self, module: CompiledModule) -> Result<CompiledModule, ToolchainError>;
}
