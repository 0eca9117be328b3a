//! Artifact export and compile-info policy
//!
//! The exporter tool stages build output; afterwards the compile-info source
//! file is either regenerated from its template (release) or removed (debug)
//! so a debug build never ships stale release metadata.

use crate::core::clock::Clock;
use crate::core::error::{RelayResult, StageError};
use crate::core::process::{CommandSpec, ProcessRunner};
use crate::pipeline::build::BuildMode;
use crate::release::compile_info::BuildMetadata;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What happens to the compile-info artifact after export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactPolicy {
  Regenerate,
  Clear,
}

impl From<BuildMode> for ArtifactPolicy {
  fn from(mode: BuildMode) -> Self {
    match mode {
      BuildMode::Release => ArtifactPolicy::Regenerate,
      BuildMode::Debug => ArtifactPolicy::Clear,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum ArtifactOutcome {
  Regenerated { path: PathBuf, sha256: String },
  Cleared { path: PathBuf, existed: bool },
}

/// Template and destination of the compile-info artifact, both absolute
#[derive(Debug, Clone)]
pub struct CompileInfoPaths {
  pub template: PathBuf,
  pub destination: PathBuf,
}

pub struct ArtifactExporter<'a> {
  runner: &'a dyn ProcessRunner,
  clock: &'a dyn Clock,
  command: &'a [String],
  workspace: &'a Path,
  compile_info: CompileInfoPaths,
}

impl<'a> ArtifactExporter<'a> {
  pub fn new(
    runner: &'a dyn ProcessRunner,
    clock: &'a dyn Clock,
    command: &'a [String],
    workspace: &'a Path,
    compile_info: CompileInfoPaths,
  ) -> Self {
    Self {
      runner,
      clock,
      command,
      workspace,
      compile_info,
    }
  }

  /// Run the exporter tool, then apply the policy selected by `mode`
  pub fn export(&self, mode: BuildMode, build_id: &str) -> RelayResult<ArtifactOutcome> {
    let spec = CommandSpec::from_argv(self.command)?.current_dir(self.workspace);
    info!(command = %spec, "exporting artifacts");

    let output = self
      .runner
      .run(&spec)
      .map_err(|e| StageError::ExportFailure { reason: e.to_string() })?;
    if !output.success() {
      return Err(
        StageError::ExportFailure {
          reason: format!("`{}` exited with code {}", spec, output.exit_code),
        }
        .into(),
      );
    }

    self.apply_policy(mode, build_id)
  }

  /// Regenerate or clear the compile-info artifact without running the exporter
  pub fn apply_policy(&self, mode: BuildMode, build_id: &str) -> RelayResult<ArtifactOutcome> {
    match ArtifactPolicy::from(mode) {
      ArtifactPolicy::Regenerate => self.regenerate(mode, build_id),
      ArtifactPolicy::Clear => self.clear(),
    }
  }

  fn regenerate(&self, mode: BuildMode, build_id: &str) -> RelayResult<ArtifactOutcome> {
    let CompileInfoPaths { template, destination } = &self.compile_info;
    let source = fs::read_to_string(template).map_err(|_| StageError::TemplateNotFound {
      path: template.clone(),
    })?;

    let metadata = BuildMetadata::collect(self.workspace, self.runner, self.clock, mode, build_id)
      .map_err(|e| StageError::ExportFailure {
        reason: format!("cannot collect build metadata: {}", e),
      })?;
    let rendered = metadata.render(&source);

    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent).map_err(|e| write_error(destination, e))?;
    }
    fs::write(destination, &rendered).map_err(|e| write_error(destination, e))?;

    let sha256 = format!("{:x}", Sha256::digest(rendered.as_bytes()));
    info!(path = %destination.display(), %sha256, version = %metadata.version, "compile-info regenerated");
    Ok(ArtifactOutcome::Regenerated {
      path: destination.clone(),
      sha256,
    })
  }

  fn clear(&self) -> RelayResult<ArtifactOutcome> {
    let destination = &self.compile_info.destination;
    let existed = destination.exists();
    if existed {
      fs::remove_file(destination).map_err(|e| write_error(destination, e))?;
      info!(path = %destination.display(), "compile-info cleared");
    }
    Ok(ArtifactOutcome::Cleared {
      path: destination.clone(),
      existed,
    })
  }
}

fn write_error(path: &Path, err: std::io::Error) -> StageError {
  StageError::WriteError {
    path: path.to_path_buf(),
    reason: err.to_string(),
  }
}
