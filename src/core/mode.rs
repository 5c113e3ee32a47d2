//! Build mode selection and step gating

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable that switches a build into development mode.
///
/// The watch command sets it for its child builds; a plain `build` with the
/// variable unset produces a production bundle.
pub const WATCH_ENV_VAR: &str = "BUNDLET_WATCH";

/// Mode a build runs in
///
/// Production is the default. Development is selected by the watch loop or
/// by exporting [`WATCH_ENV_VAR`] before a one-shot build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Watch-style build: runtime checks on, no minification, dev server
    Development,
    /// Release build: minified output, no dev server
    Production,
}

impl BuildMode {
    /// Derive the mode from the watch environment toggle.
    ///
    /// Absent or empty means production; any non-empty value means
    /// development.
    pub fn from_watch_env() -> Self {
        match std::env::var(WATCH_ENV_VAR) {
            Ok(value) if !value.is_empty() => BuildMode::Development,
            _ => BuildMode::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, BuildMode::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When a pipeline step runs relative to the build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepCondition {
    /// Runs in every build
    Always,
    /// Runs only in development builds (dev server, live reload)
    DevOnly,
    /// Runs only in production builds (minification)
    ProdOnly,
}

impl StepCondition {
    /// Whether a step with this condition runs under `mode`.
    pub fn applies_to(&self, mode: BuildMode) -> bool {
        match self {
            StepCondition::Always => true,
            StepCondition::DevOnly => mode.is_development(),
            StepCondition::ProdOnly => mode.is_production(),
        }
    }
}
