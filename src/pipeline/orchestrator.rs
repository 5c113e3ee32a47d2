//! Build orchestration - drives the step table over a build context

use crate::core::config::BuildConfig;
use crate::core::context::BuildContext;
use crate::core::mode::BuildMode;
use crate::core::report::BuildReport;
use crate::core::session::WatchSession;
use crate::pipeline::assets::{self, AssetError};
use crate::pipeline::steps::{StepKind, BUILD_STEPS};
use crate::toolchain::{
    CommandToolchain, CompileOptions, LogReloadNotifier, ProcessServerLauncher, ReloadNotifier,
    ResolveOptions, ServerLauncher, Toolchain, ToolchainError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events emitted while a build runs
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// A build began
    BuildStarted {
        build_id: Uuid,
        mode: BuildMode,
        stamp: i64,
    },
    /// A step is about to run
    StepStarted { step: StepKind },
    /// A step ran to completion
    StepCompleted { step: StepKind, duration: Duration },
    /// A step did not apply to the build mode
    StepSkipped { step: StepKind },
    /// A step hit a non-fatal problem and the build went on
    StepWarning { step: StepKind, message: String },
    /// The dev server process came up
    ServerStarted { pid: Option<u32>, url: String },
    /// The build finished with every applicable step executed
    BuildCompleted {
        build_id: Uuid,
        artifact_count: usize,
    },
    /// A step failed and the build stopped
    BuildFailed { step: StepKind, error: String },
}

/// Callback invoked for each build event
pub type BuildEventHandler = Arc<dyn Fn(BuildEvent) + Send + Sync>;

/// A build aborted by a failing step
///
/// Later steps do not run; the output directory may hold a partial
/// tree, which the clean step of the next build removes.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A toolchain command failed
    #[error("`{step}` step failed: {source}")]
    Toolchain {
        step: StepKind,
        #[source]
        source: ToolchainError,
    },

    /// A filesystem operation failed
    #[error("`{step}` step failed: {source}")]
    Asset {
        step: StepKind,
        #[source]
        source: AssetError,
    },

    /// A transforming step found no compiled module to work on
    #[error("`{step}` step has no compiled module to work on")]
    NoModule { step: StepKind },
}

impl BuildError {
    /// The step the build failed on
    pub fn step(&self) -> StepKind {
        match self {
            BuildError::Toolchain { step, .. } => *step,
            BuildError::Asset { step, .. } => *step,
            BuildError::NoModule { step } => *step,
        }
    }
}

/// Runs builds against a configuration
///
/// Holds the toolchain, the dev server launcher and the reload notifier
/// behind trait objects so tests can substitute all three. One
/// orchestrator serves any number of sequential builds; per-session
/// state (the dev server) lives in the [`WatchSession`] passed to
/// [`run_build`](Orchestrator::run_build).
pub struct Orchestrator {
    config: BuildConfig,
    toolchain: Arc<dyn Toolchain>,
    launcher: Arc<dyn ServerLauncher>,
    notifier: Arc<dyn ReloadNotifier>,
    event_handlers: Vec<BuildEventHandler>,
}

impl Orchestrator {
    pub fn new(
        config: BuildConfig,
        toolchain: Arc<dyn Toolchain>,
        launcher: Arc<dyn ServerLauncher>,
        notifier: Arc<dyn ReloadNotifier>,
    ) -> Self {
        Self {
            config,
            toolchain,
            launcher,
            notifier,
            event_handlers: Vec::new(),
        }
    }

    /// Orchestrator with the real subprocess toolchain and OS launcher
    pub fn from_config(config: BuildConfig) -> Self {
        let toolchain = Arc::new(CommandToolchain::new(config.toolchain.clone()));
        Self::new(
            config,
            toolchain,
            Arc::new(ProcessServerLauncher),
            Arc::new(LogReloadNotifier),
        )
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Register a handler for build events
    pub fn add_event_handler(&mut self, handler: BuildEventHandler) {
        self.event_handlers.push(handler);
    }

    fn emit(&self, event: BuildEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run every step of the table that applies to `mode`
    ///
    /// Steps run strictly in table order. The first failing step aborts
    /// the build; serve and livereload problems are warnings, not
    /// failures. The session tracks the dev server across repeated
    /// builds so only the first emit of a watch session spawns it.
    pub async fn run_build(
        &self,
        mode: BuildMode,
        session: &mut WatchSession,
    ) -> Result<BuildReport, BuildError> {
        let build_id = Uuid::new_v4();
        let mut ctx = BuildContext::new(mode, &self.config);
        let mut report = BuildReport::new(build_id, mode, ctx.stamp);

        info!(%build_id, mode = %mode, stamp = ctx.stamp, "Starting build");
        self.emit(BuildEvent::BuildStarted {
            build_id,
            mode,
            stamp: ctx.stamp,
        });

        for step in BUILD_STEPS {
            if !step.condition().applies_to(mode) {
                debug!("Skipping `{}` in {} mode", step, mode);
                report.record_skipped(step);
                self.emit(BuildEvent::StepSkipped { step });
                continue;
            }

            self.emit(BuildEvent::StepStarted { step });
            let started = Instant::now();

            if let Err(error) = self.run_step(step, &mut ctx, session).await {
                error!("Step `{}` failed: {}", step, error);
                self.emit(BuildEvent::BuildFailed {
                    step,
                    error: error.to_string(),
                });
                return Err(error);
            }

            let duration = started.elapsed();
            debug!("Step `{}` completed in {:?}", step, duration);
            report.record_executed(step, duration);
            self.emit(BuildEvent::StepCompleted { step, duration });
        }

        session.record_build();
        report.finish(
            std::mem::take(&mut ctx.artifacts),
            ctx.script_name(),
            ctx.stylesheet_name(),
        );

        info!(
            %build_id,
            steps = report.executed_count(),
            artifacts = report.artifacts.len(),
            "Build finished"
        );
        self.emit(BuildEvent::BuildCompleted {
            build_id,
            artifact_count: report.artifacts.len(),
        });

        Ok(report)
    }

    async fn run_step(
        &self,
        step: StepKind,
        ctx: &mut BuildContext,
        session: &mut WatchSession,
    ) -> Result<(), BuildError> {
        match step {
            StepKind::Clean => {
                assets::clean_output(&ctx.output_dir)
                    .map_err(|source| BuildError::Asset { step, source })?;
            }

            StepKind::Compile => {
                let options = CompileOptions {
                    dev_checks: ctx.mode.is_development(),
                    module_format: self.config.module_format.clone(),
                    global_name: self.config.global_name.clone(),
                    emit_source_map: self.config.sourcemap,
                };
                let module = self
                    .toolchain
                    .compile(&ctx.entry, &options)
                    .await
                    .map_err(|source| BuildError::Toolchain { step, source })?;
                ctx.module = Some(module);
            }

            StepKind::CopyAssets => {
                let artifacts = assets::copy_static_assets(
                    ctx,
                    &self.config.css_placeholder,
                    &self.config.js_placeholder,
                )
                .map_err(|source| BuildError::Asset { step, source })?;
                for artifact in artifacts {
                    ctx.record_artifact(artifact);
                }
            }

            StepKind::Resolve => {
                let module = ctx.take_module().ok_or(BuildError::NoModule { step })?;
                let options = ResolveOptions {
                    browser: self.config.resolve.browser,
                    dedupe: self.config.resolve.dedupe.clone(),
                };
                let resolved = self
                    .toolchain
                    .resolve(module, &options)
                    .await
                    .map_err(|source| BuildError::Toolchain { step, source })?;
                ctx.module = Some(resolved);
            }

            StepKind::Flatten => {
                let module = ctx.take_module().ok_or(BuildError::NoModule { step })?;
                let flattened = self
                    .toolchain
                    .flatten(module)
                    .await
                    .map_err(|source| BuildError::Toolchain { step, source })?;
                ctx.module = Some(flattened);
            }

            StepKind::Minify => {
                let module = ctx.take_module().ok_or(BuildError::NoModule { step })?;
                let minified = self
                    .toolchain
                    .minify(module)
                    .await
                    .map_err(|source| BuildError::Toolchain { step, source })?;
                ctx.module = Some(minified);
            }

            StepKind::Emit => {
                let module = ctx.take_module().ok_or(BuildError::NoModule { step })?;
                assets::write_bundle(&module, ctx, self.config.sourcemap)
                    .map_err(|source| BuildError::Asset { step, source })?;
                ctx.module = Some(module);
            }

            StepKind::Serve => {
                self.start_dev_server(session);
            }

            StepKind::Livereload => {
                let changed: Vec<PathBuf> =
                    ctx.artifacts.iter().map(|a| a.path.clone()).collect();
                if let Err(error) = self.notifier.notify(&changed) {
                    warn!("Live reload notification failed: {}", error);
                    self.emit(BuildEvent::StepWarning {
                        step,
                        message: error.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Spawn the dev server once per watch session
    ///
    /// Runs after the first successful emit. Spawn and browser failures
    /// are warnings: the bundle on disk is already good, so the build
    /// must not fail over a missing server binary.
    fn start_dev_server(&self, session: &mut WatchSession) {
        if !session.can_start_server() {
            debug!(
                session_id = %session.session_id,
                "Dev server already handled for this session"
            );
            return;
        }

        match self.launcher.launch(&self.config.dev_server.command) {
            Ok(handle) => {
                let pid = handle.id();
                session.attach_server(handle);
                info!(pid = ?pid, url = %self.config.dev_server.url, "Dev server started");
                self.emit(BuildEvent::ServerStarted {
                    pid,
                    url: self.config.dev_server.url.clone(),
                });

                if self.config.dev_server.open_browser {
                    if let Err(error) = self.launcher.open_browser(&self.config.dev_server.url) {
                        warn!("Could not open browser: {}", error);
                        self.emit(BuildEvent::StepWarning {
                            step: StepKind::Serve,
                            message: error.to_string(),
                        });
                    }
                }
            }
            Err(error) => {
                warn!("Dev server failed to start: {}", error);
                self.emit(BuildEvent::StepWarning {
                    step: StepKind::Serve,
                    message: error.to_string(),
                });
            }
        }
    }
}
