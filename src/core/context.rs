//! Build context - per-build state shared between steps

use crate::core::config::BuildConfig;
use crate::core::mode::BuildMode;
use crate::core::report::Artifact;
use crate::toolchain::CompiledModule;
use std::path::PathBuf;

/// State threaded through a single build
///
/// Created at the start of a build and handed to every step. Transforming
/// steps read and replace the compiled module; writing steps record the
/// artifacts they produce.
#[derive(Debug)]
pub struct BuildContext {
    /// Mode this build runs in
    pub mode: BuildMode,

    /// Millisecond timestamp taken when the build started, embedded in
    /// every emitted bundle name for cache busting
    pub stamp: i64,

    /// Entry module handed to the compile step
    pub entry: PathBuf,

    /// Directory the build writes into
    pub output_dir: PathBuf,

    /// Directory of static files copied into the output
    pub static_dir: PathBuf,

    /// File name of the HTML entry inside the static directory
    pub html_entry: String,

    /// Base name for emitted bundles
    pub bundle_name: String,

    /// Module produced by compile and refined by later steps
    pub module: Option<CompiledModule>,

    /// Files written to the output directory so far
    pub artifacts: Vec<Artifact>,
}

impl BuildContext {
    /// Create a context for a build starting now
    pub fn new(mode: BuildMode, config: &BuildConfig) -> Self {
        Self::with_stamp(mode, config, chrono::Utc::now().timestamp_millis())
    }

    /// Create a context with an explicit timestamp
    pub fn with_stamp(mode: BuildMode, config: &BuildConfig, stamp: i64) -> Self {
        Self {
            mode,
            stamp,
            entry: config.entry.clone(),
            output_dir: config.output_dir.clone(),
            static_dir: config.static_dir.clone(),
            html_entry: config.html_entry.clone(),
            bundle_name: config.bundle_name.clone(),
            module: None,
            artifacts: Vec::new(),
        }
    }

    /// File name of the stamped script bundle
    pub fn script_name(&self) -> String {
        format!("{}.{}.js", self.bundle_name, self.stamp)
    }

    /// File name of the stamped source map
    pub fn source_map_name(&self) -> String {
        format!("{}.map", self.script_name())
    }

    /// File name of the stamped stylesheet
    pub fn stylesheet_name(&self) -> String {
        format!("{}.{}.css", self.bundle_name, self.stamp)
    }

    /// Record a file written to the output directory
    pub fn record_artifact(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    /// Take the compiled module, leaving `None` behind
    ///
    /// Transforming steps take the module, run it through the toolchain
    /// and put the result back.
    pub fn take_module(&mut self) -> Option<CompiledModule> {
        self.module.take()
    }
}
