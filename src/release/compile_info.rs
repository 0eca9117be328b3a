//! Build metadata rendered into the compile-info source file
//!
//! Templates use `{placeholder}` markers:
//!
//! | marker        | value                                         |
//! |---------------|-----------------------------------------------|
//! | `{version}`   | frontend manifest version                     |
//! | `{date}`      | `%Y-%m-%d %H:%M:%S` (UTC) at render time      |
//! | `{target}`    | `CARGO_BUILD_TARGET`, else the rustc host     |
//! | `{platform}`  | Windows / Linux / macOS / Android / iOS       |
//! | `{toolchain}` | `rustc --version` plus channel                |
//! | `{branch}`    | current frontend branch                       |
//! | `{commit}`    | frontend HEAD                                 |
//! | `{mode}`      | `debug` or `release`                          |
//! | `{build_id}`  | force-build token of this run                 |
//!
//! Unknown markers are left untouched.

use crate::cargo::manifest::ManifestInfo;
use crate::core::clock::Clock;
use crate::core::error::RelayResult;
use crate::core::process::{CommandSpec, ProcessRunner};
use crate::core::vcs::SystemGit;
use crate::pipeline::build::BuildMode;
use serde::Serialize;
use std::path::Path;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildMetadata {
  pub version: String,
  pub date: String,
  pub target: String,
  pub platform: String,
  pub toolchain: String,
  pub branch: String,
  pub commit: String,
  pub mode: BuildMode,
  pub build_id: String,
}

impl BuildMetadata {
  /// Gather metadata for the frontend at `workspace`
  ///
  /// Only the manifest is mandatory; toolchain and git lookups degrade to
  /// `"unknown"`.
  pub fn collect(
    workspace: &Path,
    runner: &dyn ProcessRunner,
    clock: &dyn Clock,
    mode: BuildMode,
    build_id: &str,
  ) -> RelayResult<Self> {
    let manifest = ManifestInfo::load(workspace)?;
    let rustc = RustcInfo::query(runner, workspace);
    let target = std::env::var("CARGO_BUILD_TARGET")
      .ok()
      .filter(|t| !t.is_empty())
      .unwrap_or_else(|| rustc.host.clone());

    let git = SystemGit::new(workspace, runner);
    let branch = git.current_branch().unwrap_or_else(|e| {
      tracing::debug!(error = %e, "branch unavailable");
      UNKNOWN.to_string()
    });
    let commit = git.head_commit().unwrap_or_else(|e| {
      tracing::debug!(error = %e, "commit unavailable");
      UNKNOWN.to_string()
    });

    Ok(Self {
      version: manifest.version,
      date: clock.now().format("%Y-%m-%d %H:%M:%S").to_string(),
      platform: platform_name(&target).to_string(),
      target,
      toolchain: rustc.toolchain(),
      branch,
      commit,
      mode,
      build_id: build_id.to_string(),
    })
  }

  pub fn render(&self, template: &str) -> String {
    let mode = self.mode.to_string();
    let pairs: [(&str, &str); 9] = [
      ("{version}", &self.version),
      ("{date}", &self.date),
      ("{target}", &self.target),
      ("{platform}", &self.platform),
      ("{toolchain}", &self.toolchain),
      ("{branch}", &self.branch),
      ("{commit}", &self.commit),
      ("{mode}", &mode),
      ("{build_id}", &self.build_id),
    ];
    pairs
      .iter()
      .fold(template.to_string(), |acc, (marker, value)| acc.replace(marker, value))
  }
}

/// Human platform name for a target triple
pub fn platform_name(target: &str) -> &'static str {
  if target.contains("windows") {
    "Windows"
  } else if target.contains("android") {
    "Android"
  } else if target.contains("linux") {
    "Linux"
  } else if target.contains("darwin") || target.contains("macos") {
    "macOS"
  } else if target.contains("ios") {
    "iOS"
  } else {
    "Unknown"
  }
}

/// Parsed `rustc -vV`
struct RustcInfo {
  version_line: String,
  host: String,
}

impl RustcInfo {
  fn query(runner: &dyn ProcessRunner, cwd: &Path) -> Self {
    let spec = CommandSpec::new("rustc").arg("-vV").current_dir(cwd).capture_output();
    let stdout = match runner.run(&spec) {
      Ok(output) if output.success() => output.stdout,
      Ok(output) => {
        tracing::debug!(exit_code = output.exit_code, "rustc -vV failed");
        String::new()
      }
      Err(e) => {
        tracing::debug!(error = %e, "rustc unavailable");
        String::new()
      }
    };
    Self::parse(&stdout)
  }

  fn parse(stdout: &str) -> Self {
    let version_line = stdout
      .lines()
      .next()
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .unwrap_or(UNKNOWN)
      .to_string();
    let host = stdout
      .lines()
      .find_map(|l| l.strip_prefix("host:"))
      .map(|h| h.trim().to_string())
      .unwrap_or_else(|| UNKNOWN.to_string());
    Self { version_line, host }
  }

  fn toolchain(&self) -> String {
    let channel = if self.version_line.contains("nightly") {
      "nightly"
    } else if self.version_line.contains("beta") {
      "beta"
    } else {
      "stable"
    };
    format!("{} ({})", self.version_line, channel)
  }
}
