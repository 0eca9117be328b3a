//! Fail-fast sequencing of the release stages
//!
//! Each stage runs to completion before the next starts. The first failure
//! aborts the run; side effects of completed stages are left in place.

use crate::cargo::manifest::ManifestInfo;
use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::clock::Clock;
use crate::core::config::{GuardScope, RelayConfig};
use crate::core::error::{RelayError, RelayResult};
use crate::core::process::ProcessRunner;
use crate::core::repository::Repository;
use crate::pipeline::build::{BuildExecutor, BuildMode, TokenSource};
use crate::pipeline::export::{ArtifactExporter, ArtifactOutcome, CompileInfoPaths};
use crate::pipeline::package::InstallerPackager;
use crate::pipeline::state::{AbortReason, PipelineReport, PipelineState, RunArtifacts, Stage, StageReport, StageStatus};
use crate::pipeline::test_runner::CrossRepoTestRunner;
use crate::pipeline::tooling::ToolingCheck;
use crate::pipeline::visibility::{HiddenAttribute, VisibilityManager, VisibilityOutcome};
use crate::pipeline::worktree::WorktreeGuard;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
  pub mode: BuildMode,
  /// Overrides `[guard] scope` with `frontend`
  pub frontend_only: bool,
  /// Ignore the visibility debounce window
  pub force_visibility: bool,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      mode: BuildMode::Release,
      frontend_only: false,
      force_visibility: false,
    }
  }
}

/// Result of a run: the report is always produced, `failure` is set when aborted
pub struct PipelineRun {
  pub report: PipelineReport,
  pub failure: Option<RelayError>,
}

/// What a single stage hands back to the report
enum StageResult {
  Done,
  Skipped(String),
}

pub struct PipelineOrchestrator<'a> {
  config: &'a RelayConfig,
  runner: &'a dyn ProcessRunner,
  clock: &'a dyn Clock,
  tokens: &'a dyn TokenSource,
  attributes: &'a dyn HiddenAttribute,
}

impl<'a> PipelineOrchestrator<'a> {
  pub fn new(
    config: &'a RelayConfig,
    runner: &'a dyn ProcessRunner,
    clock: &'a dyn Clock,
    tokens: &'a dyn TokenSource,
    attributes: &'a dyn HiddenAttribute,
  ) -> Self {
    Self {
      config,
      runner,
      clock,
      tokens,
      attributes,
    }
  }

  pub fn run(&self, options: RunOptions) -> PipelineRun {
    let started_at = self.clock.now();
    let mut state = PipelineState::Init;
    let mut stages = Vec::with_capacity(Stage::ALL.len());
    let mut artifacts = RunArtifacts::default();
    let mut build_id = String::new();
    let mut failure = None;

    info!(mode = %options.mode, "pipeline started");

    while !state.is_terminal() {
      state = state.advance(self.elapsed_ms(started_at));
      let PipelineState::Running { stage } = state else {
        continue;
      };

      let stage_started = self.clock.now();
      let result = self.run_stage(stage, options, &mut artifacts, &mut build_id);
      let duration_ms = self.elapsed_ms(stage_started);

      match result {
        Ok(outcome) => {
          let (status, detail) = match outcome {
            StageResult::Done => (StageStatus::Success, None),
            StageResult::Skipped(reason) => (StageStatus::Skipped, Some(reason)),
          };
          info!(stage = %stage, duration_ms, "stage finished");
          stages.push(StageReport {
            stage,
            status,
            duration_ms,
            detail,
          });
        }
        Err(err) => {
          error!(stage = %stage, error = %err, "stage failed");
          let reason = AbortReason::from(&err);
          stages.push(StageReport {
            stage,
            status: StageStatus::Failed,
            duration_ms,
            detail: Some(reason.message.clone()),
          });
          state = state.abort(reason);
          failure = Some(err);
        }
      }
    }

    // Stages after an abort are listed so the report always covers the full sequence
    for stage in Stage::ALL {
      if !stages.iter().any(|s| s.stage == stage) {
        stages.push(StageReport {
          stage,
          status: StageStatus::NotRun,
          duration_ms: 0,
          detail: None,
        });
      }
    }

    let elapsed_ms = self.elapsed_ms(started_at);
    if let PipelineState::Done { .. } = state {
      info!(elapsed_ms, "pipeline done");
    }

    PipelineRun {
      report: PipelineReport {
        mode: options.mode,
        started_at,
        final_state: state,
        stages,
        elapsed_ms,
        artifacts,
      },
      failure,
    }
  }

  fn run_stage(
    &self,
    stage: Stage,
    options: RunOptions,
    artifacts: &mut RunArtifacts,
    build_id: &mut String,
  ) -> RelayResult<StageResult> {
    let config = self.config;
    let frontend = config.frontend();
    let core = config.core();

    match stage {
      Stage::CheckingTooling => {
        let programs = [&config.test.command, &config.build.command, &config.export.command]
          .into_iter()
          .filter_map(|argv| argv.first().map(String::as_str));
        let tools = config
          .tooling
          .required
          .iter()
          .map(String::as_str)
          .chain(programs)
          .chain(std::iter::once(config.package.packager.as_str()));
        ToolingCheck::new(self.runner).require(tools)?;
        Ok(StageResult::Done)
      }
      Stage::HidingArtifacts => {
        let manager = VisibilityManager::new(&config.visibility, self.runner, self.attributes, self.clock);
        let outcome = manager.apply(&frontend.path, options.force_visibility)?;
        let result = match &outcome {
          VisibilityOutcome::Applied(_) => StageResult::Done,
          VisibilityOutcome::Skipped(reason) => StageResult::Skipped(reason.to_string()),
        };
        artifacts.visibility = Some(outcome);
        Ok(result)
      }
      Stage::GuardingWorktrees => {
        let repositories = self.guarded(options, frontend, core);
        WorktreeGuard::new(self.runner)
          .ignoring(config.owned_paths())
          .require_clean(&repositories)?;
        Ok(StageResult::Done)
      }
      Stage::TestingCore => {
        CrossRepoTestRunner::new(self.runner, &config.test.command).require_pass(&core)?;
        Ok(StageResult::Done)
      }
      Stage::TestingFrontend => {
        CrossRepoTestRunner::new(self.runner, &config.test.command).require_pass(&frontend)?;
        Ok(StageResult::Done)
      }
      Stage::Building => {
        let (target_dir, binary) = self.build_output(&frontend.path);
        let executor = BuildExecutor::new(
          self.runner,
          &config.build.command,
          &config.build.token_env,
          &frontend.path,
          target_dir,
          binary,
        );
        let token = self.tokens.next_token();
        *build_id = token.to_string();
        artifacts.binary = executor.build(options.mode, token)?;
        Ok(StageResult::Done)
      }
      Stage::Exporting => {
        let exporter = ArtifactExporter::new(
          self.runner,
          self.clock,
          &config.export.command,
          &frontend.path,
          self.compile_info_paths(),
        );
        artifacts.compile_info = Some(exporter.export(options.mode, build_id)?);
        Ok(StageResult::Done)
      }
      Stage::Packaging => {
        let required = match &artifacts.compile_info {
          Some(ArtifactOutcome::Regenerated { path, .. }) => vec![path.clone()],
          _ if options.mode == BuildMode::Release => vec![self.compile_info_paths().destination],
          _ => Vec::new(),
        };
        let outcome = InstallerPackager::new(self.runner, &config.package.packager, &frontend.path)
          .with_template(config.package.template.as_ref().map(|t| config.frontend_path(t)))
          .expecting(config.package.installer.as_ref().map(|i| config.frontend_path(i)))
          .package(&config.frontend_path(&config.package.spec), &required)?;
        artifacts.installer = outcome.installer;
        Ok(StageResult::Done)
      }
    }
  }

  fn guarded(&self, options: RunOptions, frontend: Repository, core: Repository) -> Vec<Repository> {
    let scope = if options.frontend_only {
      GuardScope::Frontend
    } else {
      self.config.guard.scope
    };
    match scope {
      GuardScope::Both => vec![frontend, core],
      GuardScope::Frontend => vec![frontend],
    }
  }

  fn compile_info_paths(&self) -> CompileInfoPaths {
    CompileInfoPaths {
      template: self.config.frontend_path(&self.config.compile_info.template),
      destination: self.config.frontend_path(&self.config.compile_info.destination),
    }
  }

  /// Target directory and binary name, from config first, then cargo metadata
  fn build_output(&self, frontend: &std::path::Path) -> (PathBuf, Option<String>) {
    let build = &self.config.build;
    if let (Some(dir), Some(binary)) = (&build.target_dir, &build.binary) {
      return (self.config.frontend_path(dir), Some(binary.clone()));
    }

    let metadata = match WorkspaceMetadata::load(frontend) {
      Ok(metadata) => Some(metadata),
      Err(e) => {
        tracing::debug!(error = %e, "cargo metadata unavailable");
        None
      }
    };

    let target_dir = match (&build.target_dir, &metadata) {
      (Some(dir), _) => self.config.frontend_path(dir),
      (None, Some(m)) => m.target_directory(),
      (None, None) => frontend.join("target"),
    };
    let binary = build
      .binary
      .clone()
      .or_else(|| metadata.as_ref().and_then(WorkspaceMetadata::first_binary))
      .or_else(|| ManifestInfo::load(frontend).ok().and_then(|m| m.name));

    (target_dir, binary)
  }

  fn elapsed_ms(&self, since: chrono::DateTime<chrono::Utc>) -> i64 {
    self.clock.now().signed_duration_since(since).num_milliseconds()
  }
}
