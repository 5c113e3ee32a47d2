//! The build pipeline - step table, orchestration, asset handling, watch

pub mod assets;
pub mod orchestrator;
pub mod steps;
pub mod watch;

pub use assets::AssetError;
pub use orchestrator::{BuildError, BuildEvent, BuildEventHandler, Orchestrator};
pub use steps::{StepKind, BUILD_STEPS};
