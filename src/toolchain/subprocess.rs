//! Toolchain implementation that shells out to configured commands

use crate::core::config::ToolchainConfig;
use crate::toolchain::{
    CompileOptions, CompiledModule, ResolveOptions, Toolchain, ToolchainError,
};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs the configured toolchain commands as subprocesses
///
/// The compile command receives the entry path and option flags as
/// arguments and must print a JSON module envelope on stdout. The other
/// operations are filters: the script goes in on stdin, the transformed
/// script comes back on stdout, and styles and source map are carried
/// through unchanged.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    config: ToolchainConfig,
}

impl CommandToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    /// Run one toolchain command to completion under the configured timeout
    async fn run_command(
        &self,
        op: &'static str,
        argv: &[String],
        extra_args: &[String],
        stdin_payload: Option<&str>,
    ) -> Result<std::process::Output, ToolchainError> {
        let (program, args) = argv
            .split_first()
            .ok_or(ToolchainError::MissingCommand { op })?;

        debug!("Spawning `{}` toolchain command: {}", op, program);

        let mut child = Command::new(program)
            .args(args)
            .args(extra_args)
            .stdin(if stdin_payload.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolchainError::Spawn { op, source })?;

        // Feed stdin while draining output, so a command that starts
        // writing before it finishes reading cannot deadlock the pipe.
        let stdin = child.stdin.take();
        let feed = async {
            if let Some(mut stdin) = stdin {
                if let Some(payload) = stdin_payload {
                    stdin.write_all(payload.as_bytes()).await?;
                }
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        let secs = self.config.timeout_secs;
        let joined = timeout(
            Duration::from_secs(secs),
            async { tokio::try_join!(feed, child.wait_with_output()) },
        )
        .await
        .map_err(|_| ToolchainError::Timeout { op, secs })?;

        let (_, output) = joined.map_err(|source| ToolchainError::Io { op, source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            warn!("`{}` exited with code {}: {}", op, code, stderr.trim());
            return Err(ToolchainError::CommandFailed {
                op,
                code,
                stderr: stderr.trim().to_string(),
            });
        }

        debug!(
            "`{}` returned {} bytes of output",
            op,
            output.stdout.len()
        );

        Ok(output)
    }

    fn decode_stdout(
        op: &'static str,
        output: std::process::Output,
    ) -> Result<String, ToolchainError> {
        String::from_utf8(output.stdout).map_err(|e| ToolchainError::InvalidOutput {
            op,
            reason: format!("stdout is not UTF-8: {}", e),
        })
    }

    /// Run a filtering operation: script in on stdin, script out on stdout
    async fn run_filter(
        &self,
        op: &'static str,
        argv: &[String],
        module: CompiledModule,
        extra_args: &[String],
    ) -> Result<CompiledModule, ToolchainError> {
        let output = self
            .run_command(op, argv, extra_args, Some(&module.script))
            .await?;
        let script = Self::decode_stdout(op, output)?;
        Ok(CompiledModule { script, ..module })
    }
}

#[async_trait]
impl Toolchain for CommandToolchain {
    async fn compile(
        &self,
        entry: &Path,
        options: &CompileOptions,
    ) -> Result<CompiledModule, ToolchainError> {
        let mut extra_args = vec![
            "--format".to_string(),
            options.module_format.clone(),
            "--name".to_string(),
            options.global_name.clone(),
        ];
        if options.dev_checks {
            extra_args.push("--dev".to_string());
        }
        if options.emit_source_map {
            extra_args.push("--sourcemap".to_string());
        }
        extra_args.push(entry.display().to_string());

        let output = self
            .run_command("compile", &self.config.compile, &extra_args, None)
            .await?;
        let stdout = Self::decode_stdout("compile", output)?;

        serde_json::from_str(&stdout).map_err(|e| ToolchainError::InvalidOutput {
            op: "compile",
            reason: format!("expected a JSON module envelope: {}", e),
        })
    }

    async fn resolve(
        &self,
        module: CompiledModule,
        options: &ResolveOptions,
    ) -> Result<CompiledModule, ToolchainError> {
        let mut extra_args = Vec::new();
        if options.browser {
            extra_args.push("--browser".to_string());
        }
        if !options.dedupe.is_empty() {
            extra_args.push("--dedupe".to_string());
            extra_args.push(options.dedupe.join(","));
        }
        self.run_filter("resolve", &self.config.resolve, module, &extra_args)
            .await
    }

    async fn flatten(&self, module: CompiledModule) -> Result<CompiledModule, ToolchainError> {
        self.run_filter("flatten", &self.config.flatten, module, &[])
            .await
    }

    async fn minify(&self, module: CompiledModule) -> Result<CompiledModule, ToolchainError> {
        self.run_filter("minify", &self.config.minify, module, &[])
            .await
    }
}
