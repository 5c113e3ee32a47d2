//! Core domain models for bundlet
//!
//! This module defines the data structures a build runs on: the loaded
//! configuration, the build mode, the per-build context, the watch
//! session and the report handed back when a build finishes.

pub mod config;
pub mod context;
pub mod mode;
pub mod report;
pub mod session;

pub use context::*;
pub use mode::*;
pub use report::*;
pub use session::*;
