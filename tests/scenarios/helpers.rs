//! Shared fixtures and mocks for scenario tests

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use bundlet::core::config::BuildConfig;
use bundlet::core::{BuildMode, BuildReport, WatchSession};
use bundlet::pipeline::{BuildError, BuildEvent, Orchestrator, StepKind};
use bundlet::toolchain::{
    CompileOptions, CompiledModule, ReloadError, ReloadNotifier, ResolveOptions, ServeError,
    ServerHandle, ServerLauncher, Toolchain, ToolchainError,
};

/// The HTML entry every fixture project starts with: one stylesheet
/// placeholder, one script placeholder, plus markup that must survive
/// the rewrite untouched.
pub const FIXTURE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Document Editor</title>
  <link rel="icon" href="/favicon.png" />
  <link rel="stylesheet" href="/build/bundle.css" />
</head>
<body>
  <div id="editor-root"></div>
  <script defer src="/build/bundle.js"></script>
</body>
</html>
"#;

/// In-process toolchain that records which operations ran
///
/// Each transform appends a marker comment to the script, so output
/// files show exactly which operations touched them. `failing_at`
/// makes one operation fail the way a real subprocess failure would.
pub struct MockToolchain {
    pub operations: Arc<Mutex<Vec<&'static str>>>,
    pub dev_checks_seen: Arc<AtomicBool>,
    fail_op: Option<&'static str>,
}

impl MockToolchain {
    pub fn new() -> Self {
        Self {
            operations: Arc::new(Mutex::new(Vec::new())),
            dev_checks_seen: Arc::new(AtomicBool::new(false)),
            fail_op: None,
        }
    }

    pub fn failing_at(op: &'static str) -> Self {
        Self {
            fail_op: Some(op),
            ..Self::new()
        }
    }

    fn record(&self, op: &'static str) -> Result<(), ToolchainError> {
        self.operations.lock().unwrap().push(op);
        if self.fail_op == Some(op) {
            return Err(ToolchainError::CommandFailed {
                op,
                code: 1,
                stderr: format!("mock {} refused", op),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Toolchain for MockToolchain {
    async fn compile(
        &self,
        entry: &Path,
        options: &CompileOptions,
    ) -> Result<CompiledModule, ToolchainError> {
        self.record("compile")?;
        self.dev_checks_seen
            .store(options.dev_checks, Ordering::SeqCst);
        Ok(CompiledModule {
            script: format!("window.app = init(\"{}\");\n", entry.display()),
            styles: Some(".editor { display: flex }\n".to_string()),
            source_map: options
                .emit_source_map
                .then(|| r#"{"version":3,"mappings":"AAAA"}"#.to_string()),
        })
    }

    async fn resolve(
        &self,
        module: CompiledModule,
        _options: &ResolveOptions,
    ) -> Result<CompiledModule, ToolchainError> {
        self.record("resolve")?;
        Ok(CompiledModule {
            script: format!("{}/* resolved */\n", module.script),
            ..module
        })
    }

    async fn flatten(&self, module: CompiledModule) -> Result<CompiledModule, ToolchainError> {
        self.record("flatten")?;
        Ok(CompiledModule {
            script: format!("{}/* flattened */\n", module.script),
            ..module
        })
    }

    async fn minify(&self, module: CompiledModule) -> Result<CompiledModule, ToolchainError> {
        self.record("minify")?;
        Ok(CompiledModule {
            script: format!("{}/* minified */\n", module.script),
            ..module
        })
    }
}

struct RecordingHandle {
    shutdowns: Arc<AtomicUsize>,
}

#[async_trait]
impl ServerHandle for RecordingHandle {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    async fn shutdown(&mut self) -> Result<(), ServeError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Launcher that counts spawns and browser opens instead of forking
pub struct RecordingLauncher {
    pub spawns: Arc<AtomicUsize>,
    pub browser_opens: Arc<AtomicUsize>,
    pub shutdowns: Arc<AtomicUsize>,
    fail_spawn: bool,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self {
            spawns: Arc::new(AtomicUsize::new(0)),
            browser_opens: Arc::new(AtomicUsize::new(0)),
            shutdowns: Arc::new(AtomicUsize::new(0)),
            fail_spawn: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::new()
        }
    }
}

impl ServerLauncher for RecordingLauncher {
    fn launch(&self, command: &[String]) -> Result<Box<dyn ServerHandle>, ServeError> {
        if command.is_empty() {
            return Err(ServeError::EmptyCommand);
        }
        if self.fail_spawn {
            return Err(ServeError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "mock dev server refused to start",
            )));
        }
        self.spawns.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingHandle {
            shutdowns: self.shutdowns.clone(),
        }))
    }

    fn open_browser(&self, _url: &str) -> Result<(), ServeError> {
        self.browser_opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Notifier that collects every reload broadcast
pub struct RecordingNotifier {
    pub notifications: Arc<Mutex<Vec<Vec<PathBuf>>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ReloadNotifier for RecordingNotifier {
    fn notify(&self, changed: &[PathBuf]) -> Result<(), ReloadError> {
        self.notifications.lock().unwrap().push(changed.to_vec());
        Ok(())
    }
}

/// A widget project on disk: entry script, HTML entry, static assets
pub struct FixtureProject {
    dir: TempDir,
}

impl FixtureProject {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("public/assets")).unwrap();
        std::fs::write(root.join("src/main.js"), "import './editor';\n").unwrap();
        std::fs::write(root.join("public/index.html"), FIXTURE_HTML).unwrap();
        std::fs::write(root.join("public/favicon.png"), b"\x89PNG").unwrap();
        std::fs::write(root.join("public/assets/logo.svg"), "<svg/>").unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Config for this project with every path absolute
    pub fn config(&self) -> BuildConfig {
        let root = self.path().display();
        let yaml = format!(
            r#"
name: editor-widget
entry: {root}/src/main.js
output_dir: {root}/build
static_dir: {root}/public
html_entry: index.html
toolchain:
  compile: [mock-compile]
  resolve: [mock-resolve]
  flatten: [mock-flatten]
  minify: [mock-minify]
dev_server:
  command: [mock-dev-server]
  url: http://localhost:5000
watch:
  paths: [{root}/src, {root}/public]
"#,
            root = root
        );
        BuildConfig::from_yaml(&yaml).unwrap()
    }

    pub fn write_html(&self, html: &str) {
        std::fs::write(self.path().join("public/index.html"), html).unwrap();
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("build")
    }

    pub fn output_html(&self) -> String {
        std::fs::read_to_string(self.output_dir().join("index.html")).unwrap()
    }
}

/// One orchestrator wired to mocks, with handles on everything the
/// mocks record
pub struct TestBuild {
    pub fixture: FixtureProject,
    pub orchestrator: Orchestrator,
    pub operations: Arc<Mutex<Vec<&'static str>>>,
    pub dev_checks_seen: Arc<AtomicBool>,
    pub spawns: Arc<AtomicUsize>,
    pub browser_opens: Arc<AtomicUsize>,
    pub shutdowns: Arc<AtomicUsize>,
    pub notifications: Arc<Mutex<Vec<Vec<PathBuf>>>>,
    pub events: Arc<Mutex<Vec<BuildEvent>>>,
}

impl TestBuild {
    pub fn new() -> Self {
        let fixture = FixtureProject::new();
        let config = fixture.config();
        Self::assemble(fixture, config, MockToolchain::new(), RecordingLauncher::new())
    }

    pub fn failing_at(op: &'static str) -> Self {
        let fixture = FixtureProject::new();
        let config = fixture.config();
        Self::assemble(
            fixture,
            config,
            MockToolchain::failing_at(op),
            RecordingLauncher::new(),
        )
    }

    pub fn with_failing_server() -> Self {
        let fixture = FixtureProject::new();
        let config = fixture.config();
        Self::assemble(
            fixture,
            config,
            MockToolchain::new(),
            RecordingLauncher::failing(),
        )
    }

    pub fn assemble(
        fixture: FixtureProject,
        config: BuildConfig,
        toolchain: MockToolchain,
        launcher: RecordingLauncher,
    ) -> Self {
        let notifier = RecordingNotifier::new();

        let operations = toolchain.operations.clone();
        let dev_checks_seen = toolchain.dev_checks_seen.clone();
        let spawns = launcher.spawns.clone();
        let browser_opens = launcher.browser_opens.clone();
        let shutdowns = launcher.shutdowns.clone();
        let notifications = notifier.notifications.clone();

        let mut orchestrator = Orchestrator::new(
            config,
            Arc::new(toolchain),
            Arc::new(launcher),
            Arc::new(notifier),
        );

        let events: Arc<Mutex<Vec<BuildEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        orchestrator.add_event_handler(Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        Self {
            fixture,
            orchestrator,
            operations,
            dev_checks_seen,
            spawns,
            browser_opens,
            shutdowns,
            notifications,
            events,
        }
    }

    pub async fn run(
        &self,
        mode: BuildMode,
        session: &mut WatchSession,
    ) -> Result<BuildReport, BuildError> {
        self.orchestrator.run_build(mode, session).await
    }

    /// Toolchain operations in the order they ran
    pub fn ran_operations(&self) -> Vec<&'static str> {
        self.operations.lock().unwrap().clone()
    }

    /// Messages from every StepWarning event seen so far
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                BuildEvent::StepWarning { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Assert a step ran to completion in this build
pub fn assert_step_executed(report: &BuildReport, step: StepKind) {
    assert!(
        report.executed(step),
        "Step '{}' should have executed. Outcomes: {:?}",
        step,
        report.steps
    );
}

/// Assert a step was skipped by mode gating
pub fn assert_step_skipped(report: &BuildReport, step: StepKind) {
    assert!(
        report.skipped(step),
        "Step '{}' should have been skipped. Outcomes: {:?}",
        step,
        report.steps
    );
}

/// Count non-overlapping occurrences of `needle` in `haystack`
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_toolchain_reports_failed_op() {
        let toolchain = MockToolchain::failing_at("flatten");

        let module = toolchain
            .compile(Path::new("src/main.js"), &CompileOptions {
                dev_checks: false,
                module_format: "iife".to_string(),
                global_name: "app".to_string(),
                emit_source_map: false,
            })
            .await
            .unwrap();

        match toolchain.flatten(module).await {
            Err(ToolchainError::CommandFailed { op, code, .. }) => {
                assert_eq!(op, "flatten");
                assert_eq!(code, 1);
            }
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_fixture_project_passes_validation() {
        let fixture = FixtureProject::new();
        let config = fixture.config();

        assert_eq!(config.name, "editor-widget");
        assert!(fixture.path().join("public/index.html").is_file());
        assert!(fixture.path().join("src/main.js").is_file());
    }
}
