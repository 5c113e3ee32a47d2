mod cli;
mod core;
mod pipeline;
mod toolchain;

use anyhow::{Context, Result};
use cli::commands::{BuildCommand, ValidateCommand, WatchCommand};
use cli::output::*;
use cli::{Cli, Command};
use crate::core::config::BuildConfig;
use crate::core::mode::{BuildMode, WATCH_ENV_VAR};
use crate::core::report::BuildReport;
use crate::core::session::WatchSession;
use pipeline::orchestrator::{BuildEvent, Orchestrator};
use pipeline::steps::BUILD_STEPS;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Build(cmd) => run_build(cmd, &cli).await?,
        Command::Watch(cmd) => run_watch(cmd, &cli).await?,
        Command::Clean => clean_output(&cli)?,
        Command::Validate(cmd) => validate_config(cmd, &cli)?,
    }

    Ok(())
}

async fn run_build(cmd: &BuildCommand, cli: &Cli) -> Result<()> {
    // Load build config
    let config = BuildConfig::from_file(&cli.config)
        .context("Failed to load build config")?;

    println!("{} Loaded project: {}", INFO, style(&config.name).bold());

    let mode = cmd
        .mode
        .map(BuildMode::from)
        .unwrap_or_else(BuildMode::from_watch_env);

    let mut orchestrator = Orchestrator::from_config(config);

    // Progress bar over the steps that apply to this mode
    let total = BUILD_STEPS
        .iter()
        .filter(|step| step.condition().applies_to(mode))
        .count();
    let progress = create_progress_bar(total);
    let bar = progress.clone();
    orchestrator.add_event_handler(Arc::new(move |event| {
        bar.println(format_build_event(&event));
        if matches!(event, BuildEvent::StepCompleted { .. }) {
            bar.inc(1);
        }
    }));

    let mut session = WatchSession::new();
    println!();
    let result = orchestrator.run_build(mode, &mut session).await;
    progress.finish_and_clear();

    // A one-shot build has no watch loop to own the dev server.
    if session.server_started() {
        println!(
            "{} Dev server only outlives `watch` sessions; stopping it",
            INFO
        );
        session.shutdown().await.context("Failed to stop dev server")?;
    }

    // Print final status
    match result {
        Ok(report) => {
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            println!(
                "\n{} {} build completed {}",
                CHECK,
                style(report.mode).bold(),
                style("successfully").green()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(e.step()).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn run_watch(cmd: &WatchCommand, cli: &Cli) -> Result<()> {
    let mut config = BuildConfig::from_file(&cli.config)
        .context("Failed to load build config")?;
    if cmd.no_open {
        config.dev_server.open_browser = false;
    }

    // Toolchain children see the same toggle the mode resolution reads.
    std::env::set_var(WATCH_ENV_VAR, "1");

    println!(
        "{} Watching {} ({} -> {})",
        ROCKET,
        style(&config.name).bold(),
        style(config.entry.display()).cyan(),
        style(config.output_dir.display()).cyan()
    );

    let mut orchestrator = Orchestrator::from_config(config);
    orchestrator.add_event_handler(Arc::new(|event| {
        println!("{}", format_build_event(&event));
    }));

    let mut session = WatchSession::new();
    pipeline::watch::run_watch(&orchestrator, &mut session)
        .await
        .context("Watch session did not shut down cleanly")?;

    println!(
        "{} Watch session closed after {} build(s)",
        CHECK,
        style(session.builds_completed).cyan()
    );
    Ok(())
}

fn clean_output(cli: &Cli) -> Result<()> {
    let config = BuildConfig::from_file(&cli.config)
        .context("Failed to load build config")?;

    pipeline::assets::clean_output(&config.output_dir)
        .with_context(|| format!("Failed to clean {}", config.output_dir.display()))?;

    println!(
        "{} Cleaned {}",
        CHECK,
        style(config.output_dir.display()).cyan()
    );
    Ok(())
}

fn validate_config(cmd: &ValidateCommand, cli: &Cli) -> Result<()> {
    println!("{} Validating build config...", INFO);

    let result = BuildConfig::from_file(&cli.config);

    match result {
        Ok(config) => {
            println!("{} Build configuration is valid!", CHECK);
            println!("  Project: {}", style(&config.name).bold());
            println!("  Entry: {}", style(config.entry.display()).cyan());
            println!("  Output: {}", style(config.output_dir.display()).cyan());
            println!("  Watch paths: {}", style(config.watch.paths.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn print_report(report: &BuildReport) {
    println!("\n{} Build Report", INFO);
    println!("  ID: {}", style(report.build_id).cyan());
    println!("  Mode: {}", style(report.mode).bold());
    println!("  Script: {}", style(&report.script_name).cyan());
    println!("  Stylesheet: {}", style(&report.stylesheet_name).cyan());
    if let Some(duration) = report.duration() {
        println!(
            "  Duration: {}",
            style(format!("{}ms", duration.num_milliseconds())).dim()
        );
    }
    println!("  Steps ({} executed):", report.executed_count());
    for record in &report.steps {
        println!("    {}", format_step_record(record));
    }
    println!("  Artifacts: {}", style(report.artifacts.len()).cyan());
}
