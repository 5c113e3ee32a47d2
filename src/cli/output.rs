//! CLI output formatting

use crate::core::report::{StepOutcome, StepRecord};
use crate::pipeline::orchestrator::BuildEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a recorded step outcome for display
pub fn format_step_record(record: &StepRecord) -> String {
    match &record.outcome {
        StepOutcome::Executed { duration_ms } => format!(
            "{} {} ({})",
            CHECK,
            style(record.step).green(),
            style(format!("{}ms", duration_ms)).dim()
        ),
        StepOutcome::Skipped => format!(
            "{} {} {}",
            INFO,
            style(record.step).dim(),
            style("(skipped)").dim()
        ),
    }
}

/// Format a build event for display
pub fn format_build_event(event: &BuildEvent) -> String {
    match event {
        BuildEvent::BuildStarted { build_id, mode, .. } => format!(
            "{} Starting {} build ({})",
            ROCKET,
            style(mode).bold(),
            style(&build_id.to_string()[..8]).dim()
        ),
        BuildEvent::StepStarted { step } => format!("{} {}", SPINNER, style(step).cyan()),
        BuildEvent::StepCompleted { step, duration } => format!(
            "{} {} ({})",
            CHECK,
            style(step).green(),
            style(format_duration(*duration)).dim()
        ),
        BuildEvent::StepSkipped { step } => {
            format!("{} {} {}", INFO, style(step).dim(), style("(skipped)").dim())
        }
        BuildEvent::StepWarning { step, message } => {
            format!("{} {}: {}", WARN, style(step).yellow(), style(message).dim())
        }
        BuildEvent::ServerStarted { pid, url } => {
            let pid = pid.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string());
            format!(
                "{} Dev server up at {} (pid {})",
                ROCKET,
                style(url).cyan(),
                style(pid).dim()
            )
        }
        BuildEvent::BuildCompleted {
            build_id,
            artifact_count,
        } => format!(
            "{} Build ({}) wrote {} artifact(s)",
            CHECK,
            style(&build_id.to_string()[..8]).dim(),
            style(artifact_count).cyan()
        ),
        BuildEvent::BuildFailed { step, error } => {
            format!("{} {}: {}", CROSS, style(step).red(), style(error).dim())
        }
    }
}

/// Format a duration as milliseconds or fractional seconds
pub fn format_duration(duration: Duration) -> String {
    if duration.as_millis() < 1000 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
