//! The fixed step table a build runs through

use crate::core::mode::StepCondition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A step of the build pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Empty the output directory
    Clean,
    /// Compile the entry module
    Compile,
    /// Copy static files and rewrite the HTML entry
    CopyAssets,
    /// Resolve bare imports against installed packages
    Resolve,
    /// Flatten legacy module wrappers
    Flatten,
    /// Minify the script (production only)
    Minify,
    /// Write the stamped bundle files
    Emit,
    /// Spawn the dev server (development only)
    Serve,
    /// Notify dev clients of changed artifacts (development only)
    Livereload,
}

/// All steps in execution order
///
/// Clean runs first so a failed build never destroys the previous
/// build's output, and minify runs before emit so only the final script
/// is ever written. Serve and livereload come last: the server starts
/// against a fully written output directory.
pub const BUILD_STEPS: [StepKind; 9] = [
    StepKind::Clean,
    StepKind::Compile,
    StepKind::CopyAssets,
    StepKind::Resolve,
    StepKind::Flatten,
    StepKind::Minify,
    StepKind::Emit,
    StepKind::Serve,
    StepKind::Livereload,
];

impl StepKind {
    /// Step name used in logs, reports and errors
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Clean => "clean",
            StepKind::Compile => "compile",
            StepKind::CopyAssets => "copy-assets",
            StepKind::Resolve => "resolve",
            StepKind::Flatten => "flatten",
            StepKind::Minify => "minify",
            StepKind::Emit => "emit",
            StepKind::Serve => "serve",
            StepKind::Livereload => "livereload",
        }
    }

    /// When this step runs relative to the build mode
    pub fn condition(&self) -> StepCondition {
        match self {
            StepKind::Minify => StepCondition::ProdOnly,
            StepKind::Serve | StepKind::Livereload => StepCondition::DevOnly,
            _ => StepCondition::Always,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
