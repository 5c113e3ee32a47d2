//! bundlet - build orchestrator and locale bootstrap for the embeddable
//! document editor widget

pub mod cli;
pub mod core;
pub mod i18n;
pub mod pipeline;
pub mod toolchain;

// Re-export commonly used types
pub use crate::core::config::BuildConfig;
pub use crate::core::{BuildContext, BuildMode, BuildReport, WatchSession};
pub use crate::i18n::{detect_locale, I18n, I18nError, TranslationRegistry, SUPPORTED_LOCALES};
pub use crate::pipeline::{BuildError, BuildEvent, Orchestrator, StepKind, BUILD_STEPS};
pub use crate::toolchain::{CompiledModule, Toolchain, ToolchainError};
