//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{BuildCommand, ValidateCommand, WatchCommand};
use std::ffi::OsString;

/// Build tool for the embeddable document editor widget
#[derive(Debug, Parser, Clone)]
#[command(name = "bundlet")]
#[command(author = "Bundlet Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Bundles the embeddable document editor widget", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the build configuration file
    #[arg(short, long, global = true, default_value = "bundlet.yml")]
    pub config: String,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a full build
    Build(BuildCommand),

    /// Rebuild on changes with the dev server running
    Watch(WatchCommand),

    /// Empty the output directory
    Clean,

    /// Validate the build configuration
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
