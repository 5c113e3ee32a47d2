//! Build reports - what a finished build produced

use crate::core::mode::BuildMode;
use crate::pipeline::steps::StepKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of a single pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Step ran to completion
    Executed {
        /// Wall-clock duration in milliseconds
        duration_ms: u64,
    },
    /// Step did not apply to the build mode
    Skipped,
}

/// A step together with its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Which step this records
    pub step: StepKind,

    /// What happened to it
    pub outcome: StepOutcome,
}

/// Kind of file a build wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// The stamped script bundle
    Script,
    /// The source map next to the script
    SourceMap,
    /// The stamped stylesheet
    Stylesheet,
    /// The rewritten HTML entry
    Html,
    /// A static file copied verbatim
    Static,
}

/// A file written to the output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// What kind of output this is
    pub kind: ArtifactKind,

    /// Where it was written
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Summary of a finished build
///
/// Collected by the orchestrator as steps run and returned to the caller.
/// Serializes to JSON for the `build --json` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Unique id of this build
    pub build_id: Uuid,

    /// Mode the build ran in
    pub mode: BuildMode,

    /// Millisecond timestamp embedded in the bundle names
    pub stamp: i64,

    /// When the build started
    pub started_at: DateTime<Utc>,

    /// When the build finished, if it got that far
    pub finished_at: Option<DateTime<Utc>>,

    /// Per-step outcomes in pipeline order
    pub steps: Vec<StepRecord>,

    /// Files written to the output directory
    pub artifacts: Vec<Artifact>,

    /// File name of the emitted script bundle
    pub script_name: String,

    /// File name of the emitted stylesheet
    pub stylesheet_name: String,
}

impl BuildReport {
    /// Start a report for a build beginning now
    pub fn new(build_id: Uuid, mode: BuildMode, stamp: i64) -> Self {
        Self {
            build_id,
            mode,
            stamp,
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            artifacts: Vec::new(),
            script_name: String::new(),
            stylesheet_name: String::new(),
        }
    }

    /// Record a step that ran to completion
    pub fn record_executed(&mut self, step: StepKind, duration: Duration) {
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Executed {
                duration_ms: duration.as_millis() as u64,
            },
        });
    }

    /// Record a step skipped by mode gating
    pub fn record_skipped(&mut self, step: StepKind) {
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Skipped,
        });
    }

    /// Close the report with the artifacts the build wrote
    pub fn finish(&mut self, artifacts: Vec<Artifact>, script_name: String, stylesheet_name: String) {
        self.finished_at = Some(Utc::now());
        self.artifacts = artifacts;
        self.script_name = script_name;
        self.stylesheet_name = stylesheet_name;
    }

    /// Outcome recorded for a step, if the build got that far
    pub fn outcome_for(&self, step: StepKind) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|record| record.step == step)
            .map(|record| &record.outcome)
    }

    /// Whether a step ran to completion
    pub fn executed(&self, step: StepKind) -> bool {
        matches!(self.outcome_for(step), Some(StepOutcome::Executed { .. }))
    }

    /// Whether a step was skipped by mode gating
    pub fn skipped(&self, step: StepKind) -> bool {
        matches!(self.outcome_for(step), Some(StepOutcome::Skipped))
    }

    /// Number of steps that ran to completion
    pub fn executed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|record| matches!(record.outcome, StepOutcome::Executed { .. }))
            .count()
    }

    /// Paths of artifacts of one kind
    pub fn artifacts_of(&self, kind: ArtifactKind) -> Vec<&PathBuf> {
        self.artifacts
            .iter()
            .filter(|artifact| artifact.kind == kind)
            .map(|artifact| &artifact.path)
            .collect()
    }

    /// Total wall-clock duration, if the build finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}
