//! Workspace build with a forced-rebuild token
//!
//! The compile-info artifact must describe *this* invocation even when
//! nothing in the sources changed. The build environment therefore carries a
//! fresh [`ForceBuildToken`] on every run; the consumer's build script watches
//! that variable (`cargo:rerun-if-env-changed`) and regenerates its metadata.

use crate::core::error::{RelayResult, StageError};
use crate::core::process::{CommandSpec, ProcessRunner};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{info, warn};

/// Compilation profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
  Debug,
  Release,
}

impl BuildMode {
  /// Name of the profile directory under the target dir
  pub fn profile_dir(self) -> &'static str {
    match self {
      BuildMode::Debug => "debug",
      BuildMode::Release => "release",
    }
  }
}

impl fmt::Display for BuildMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.profile_dir())
  }
}

/// Opaque value that differs on every build invocation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ForceBuildToken(String);

impl ForceBuildToken {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ForceBuildToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Source of force-build tokens
pub trait TokenSource {
  fn next_token(&self) -> ForceBuildToken;
}

/// Nanosecond timestamps, bumped when the clock has not moved since the last
/// token so two tokens are never equal.
#[derive(Debug, Default)]
pub struct TimestampTokens {
  last: AtomicI64,
}

impl TokenSource for TimestampTokens {
  fn next_token(&self) -> ForceBuildToken {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or(0);
    let mut current = self.last.load(Ordering::Relaxed);
    loop {
      let next = now.max(current + 1);
      match self
        .last
        .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
      {
        Ok(_) => return ForceBuildToken::new(next.to_string()),
        Err(actual) => current = actual,
      }
    }
  }
}

/// Invokes the build tool for the whole frontend workspace
pub struct BuildExecutor<'a> {
  runner: &'a dyn ProcessRunner,
  command: &'a [String],
  token_env: &'a str,
  workspace: &'a Path,
  target_dir: PathBuf,
  binary: Option<String>,
}

impl<'a> BuildExecutor<'a> {
  pub fn new(
    runner: &'a dyn ProcessRunner,
    command: &'a [String],
    token_env: &'a str,
    workspace: &'a Path,
    target_dir: PathBuf,
    binary: Option<String>,
  ) -> Self {
    Self {
      runner,
      command,
      token_env,
      workspace,
      target_dir,
      binary,
    }
  }

  /// Path the built binary is expected at for `mode`; `None` when no binary
  /// name could be resolved
  pub fn binary_path(&self, mode: BuildMode) -> Option<PathBuf> {
    let name = self.binary.as_ref()?;
    Some(
      self
        .target_dir
        .join(mode.profile_dir())
        .join(format!("{}{}", name, std::env::consts::EXE_SUFFIX)),
    )
  }

  /// Build in `mode` with `token` exposed to the build environment
  ///
  /// The token is only referenced by the spawned process; it is dropped when
  /// this returns.
  pub fn build(&self, mode: BuildMode, token: ForceBuildToken) -> RelayResult<Option<PathBuf>> {
    let mut spec = CommandSpec::from_argv(self.command)?
      .current_dir(self.workspace)
      .env(self.token_env, token.as_str());
    if mode == BuildMode::Release {
      spec = spec.arg("--release");
    }

    info!(%mode, command = %spec, token = %token, "building workspace");

    let exit_code = match self.runner.run(&spec) {
      Ok(output) => output.exit_code,
      Err(e) => {
        warn!(error = %e, "build tool could not be started");
        -1
      }
    };

    if exit_code != 0 {
      return Err(StageError::BuildFailure { exit_code }.into());
    }

    Ok(self.binary_path(mode))
  }
}
