//! Build configuration loading and validation

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-level build configuration, loaded from `bundlet.yml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project name, shown in logs and reports
    pub name: String,

    /// Entry module handed to the compile step
    #[serde(default = "default_entry")]
    pub entry: PathBuf,

    /// Directory the pipeline writes bundles into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory of static files copied verbatim into the output
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// File name of the HTML entry inside the static directory
    #[serde(default = "default_html_entry")]
    pub html_entry: String,

    /// Base name for emitted bundles (`<bundle_name>.<stamp>.js`)
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,

    /// Module format requested from the compiler (e.g. `iife`)
    #[serde(default = "default_module_format")]
    pub module_format: String,

    /// Global variable name the bundle binds itself to
    #[serde(default = "default_global_name")]
    pub global_name: String,

    /// Whether to emit a source map next to the script
    #[serde(default = "default_true")]
    pub sourcemap: bool,

    /// Stylesheet href the HTML entry carries before rewriting
    #[serde(default = "default_css_placeholder")]
    pub css_placeholder: String,

    /// Script src the HTML entry carries before rewriting
    #[serde(default = "default_js_placeholder")]
    pub js_placeholder: String,

    /// Dev server settings used by development builds
    #[serde(default)]
    pub dev_server: DevServerConfig,

    /// Module resolution settings forwarded to the resolve step
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// External toolchain commands, one per transforming step
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Watch loop settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Dev server spawned by development builds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevServerConfig {
    /// Command and arguments that start the server
    #[serde(default = "default_server_command")]
    pub command: Vec<String>,

    /// URL opened in the browser once the server is started
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Whether to open the browser after the first spawn
    #[serde(default = "default_true")]
    pub open_browser: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        DevServerConfig {
            command: default_server_command(),
            url: default_server_url(),
            open_browser: true,
        }
    }
}

/// Module resolution options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Prefer browser variants of packages
    #[serde(default = "default_true")]
    pub browser: bool,

    /// Packages that must resolve to a single copy
    #[serde(default)]
    pub dedupe: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        ResolveConfig {
            browser: true,
            dedupe: Vec::new(),
        }
    }
}

/// Commands for the external toolchain, one argv vector per operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Compiles the entry module, printing a JSON module envelope
    #[serde(default)]
    pub compile: Vec<String>,

    /// Resolves imports, filtering the script stdin to stdout
    #[serde(default)]
    pub resolve: Vec<String>,

    /// Flattens legacy module wrappers, filtering stdin to stdout
    #[serde(default)]
    pub flatten: Vec<String>,

    /// Minifies the script, filtering stdin to stdout
    #[serde(default)]
    pub minify: Vec<String>,

    /// Seconds a single toolchain command may run before it is killed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Watch loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directories scanned for changes
    #[serde(default = "default_watch_paths")]
    pub paths: Vec<PathBuf>,

    /// Quiet window after a change before the rebuild starts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Interval between filesystem scans
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Clear the terminal before each rebuild
    #[serde(default)]
    pub clear_screen: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            paths: default_watch_paths(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            clear_screen: false,
        }
    }
}

fn default_entry() -> PathBuf {
    PathBuf::from("src/main.js")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_html_entry() -> String {
    "index.html".to_string()
}

fn default_bundle_name() -> String {
    "bundle".to_string()
}

fn default_module_format() -> String {
    "iife".to_string()
}

fn default_global_name() -> String {
    "app".to_string()
}

fn default_true() -> bool {
    true
}

fn default_css_placeholder() -> String {
    "/build/bundle.css".to_string()
}

fn default_js_placeholder() -> String {
    "/build/bundle.js".to_string()
}

fn default_server_command() -> Vec<String> {
    vec![
        "yarn".to_string(),
        "start".to_string(),
        "--dev".to_string(),
    ]
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_watch_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("src"), PathBuf::from("public")]
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl BuildConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: BuildConfig =
            serde_yaml::from_str(yaml).context("Failed to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("Project name cannot be empty");
        }

        if self.entry.as_os_str().is_empty() {
            bail!("Entry module path cannot be empty");
        }

        if self.bundle_name.is_empty() {
            bail!("Bundle name cannot be empty");
        }

        if self.html_entry.is_empty() {
            bail!("HTML entry name cannot be empty");
        }

        if self.css_placeholder.is_empty() || self.js_placeholder.is_empty() {
            bail!("HTML placeholders cannot be empty");
        }

        if self.css_placeholder == self.js_placeholder {
            bail!("Stylesheet and script placeholders must differ");
        }

        let commands = [
            ("compile", &self.toolchain.compile),
            ("resolve", &self.toolchain.resolve),
            ("flatten", &self.toolchain.flatten),
            ("minify", &self.toolchain.minify),
        ];
        for (op, command) in commands {
            if command.is_empty() {
                bail!("toolchain.{} command is empty", op);
            }
        }

        if self.toolchain.timeout_secs == 0 {
            bail!("toolchain.timeout_secs must be greater than zero");
        }

        if self.dev_server.command.is_empty() {
            bail!("dev_server.command is empty");
        }

        // The clean step empties the output directory, so nothing the
        // build reads from may live inside it.
        if self.static_dir == self.output_dir {
            bail!("Static directory and output directory must differ");
        }
        if self.static_dir.starts_with(&self.output_dir) {
            bail!(
                "Static directory '{}' is inside the output directory",
                self.static_dir.display()
            );
        }
        if self.entry.starts_with(&self.output_dir) {
            bail!(
                "Entry module '{}' is inside the output directory",
                self.entry.display()
            );
        }

        if self.watch.paths.is_empty() {
            bail!("watch.paths must name at least one directory");
        }

        if self.watch.poll_interval_ms == 0 {
            bail!("watch.poll_interval_ms must be greater than zero");
        }

        Ok(())
    }
}
