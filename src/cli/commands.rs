//! CLI command definitions

use crate::core::mode::BuildMode;
use clap::Args;

/// Run a full build
#[derive(Debug, Args, Clone)]
pub struct BuildCommand {
    /// Build mode; defaults to the watch environment toggle
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output the build report in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Rebuild on changes with the dev server running
#[derive(Debug, Args, Clone)]
pub struct WatchCommand {
    /// Don't open the browser when the dev server starts
    #[arg(long)]
    pub no_open: bool,
}

/// Validate the build configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Build mode argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    #[clap(name = "dev")]
    Development,
    #[clap(name = "prod")]
    Production,
}

impl From<ModeArg> for BuildMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Development => BuildMode::Development,
            ModeArg::Production => BuildMode::Production,
        }
    }
}
