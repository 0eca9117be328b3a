//! Pipeline state machine and run report
//!
//! ```text
//! Init -> CheckingTooling -> HidingArtifacts -> GuardingWorktrees -> TestingCore
//!      -> TestingFrontend -> Building -> Exporting -> Packaging -> Done
//! ```
//!
//! Every stage may instead move to the terminal `Aborted(stage, reason)`.
//! There are no retry transitions.

use crate::core::error::RelayError;
use crate::pipeline::build::BuildMode;
use crate::pipeline::export::ArtifactOutcome;
use crate::pipeline::visibility::VisibilityOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
  CheckingTooling,
  HidingArtifacts,
  GuardingWorktrees,
  TestingCore,
  TestingFrontend,
  Building,
  Exporting,
  Packaging,
}

impl Stage {
  /// Execution order
  pub const ALL: [Stage; 8] = [
    Stage::CheckingTooling,
    Stage::HidingArtifacts,
    Stage::GuardingWorktrees,
    Stage::TestingCore,
    Stage::TestingFrontend,
    Stage::Building,
    Stage::Exporting,
    Stage::Packaging,
  ];

  pub fn next(self) -> Option<Stage> {
    let idx = Self::ALL.iter().position(|s| *s == self)?;
    Self::ALL.get(idx + 1).copied()
  }

  pub fn label(self) -> &'static str {
    match self {
      Stage::CheckingTooling => "checking tooling",
      Stage::HidingArtifacts => "hiding artifacts",
      Stage::GuardingWorktrees => "guarding worktrees",
      Stage::TestingCore => "testing core",
      Stage::TestingFrontend => "testing frontend",
      Stage::Building => "building",
      Stage::Exporting => "exporting",
      Stage::Packaging => "packaging",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortReason {
  /// Error category, e.g. `DirtyWorktree`
  pub kind: String,
  pub message: String,
  pub exit_code: i32,
}

impl From<&RelayError> for AbortReason {
  fn from(err: &RelayError) -> Self {
    let kind = match err {
      RelayError::Stage(e) => e.kind(),
      RelayError::Config(_) => "Config",
      RelayError::Git(_) => "Git",
      RelayError::Io(_) => "Io",
      RelayError::Message { .. } => "Error",
    };
    Self {
      kind: kind.to_string(),
      message: err.to_string(),
      exit_code: err.exit_code().as_i32(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state")]
pub enum PipelineState {
  Init,
  Running { stage: Stage },
  Done { elapsed_ms: i64 },
  Aborted { stage: Stage, reason: AbortReason },
}

impl PipelineState {
  /// State after the current one completes successfully
  pub fn advance(&self, elapsed_ms: i64) -> PipelineState {
    match self {
      PipelineState::Init => PipelineState::Running {
        stage: Stage::CheckingTooling,
      },
      PipelineState::Running { stage } => match stage.next() {
        Some(next) => PipelineState::Running { stage: next },
        None => PipelineState::Done { elapsed_ms },
      },
      terminal => terminal.clone(),
    }
  }

  /// Terminal failure of the running stage; terminal states stay unchanged
  pub fn abort(&self, reason: AbortReason) -> PipelineState {
    match self {
      PipelineState::Running { stage } => PipelineState::Aborted { stage: *stage, reason },
      other => other.clone(),
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, PipelineState::Done { .. } | PipelineState::Aborted { .. })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
  Success,
  Skipped,
  Failed,
  NotRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub stage: Stage,
  pub status: StageStatus,
  pub duration_ms: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
}

/// Paths and digests left behind by the run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunArtifacts {
  pub visibility: Option<VisibilityOutcome>,
  pub binary: Option<PathBuf>,
  pub compile_info: Option<ArtifactOutcome>,
  pub installer: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
  pub mode: BuildMode,
  pub started_at: DateTime<Utc>,
  pub final_state: PipelineState,
  pub stages: Vec<StageReport>,
  pub elapsed_ms: i64,
  pub artifacts: RunArtifacts,
}

impl PipelineReport {
  #[allow(dead_code)]
  pub fn succeeded(&self) -> bool {
    matches!(self.final_state, PipelineState::Done { .. })
  }

  #[allow(dead_code)]
  pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
    self.stages.iter().find(|s| s.stage == stage)
  }
}
