//! System git backend - zero dependencies
//!
//! Uses git porcelain/plumbing output for the few queries the pipeline needs:
//! - Worktree cleanliness (`status --porcelain`)
//! - Ignored paths for the visibility scan (`ls-files --ignored`)
//! - Branch and HEAD for compile-info metadata
//!
//! Every invocation goes through a [`ProcessRunner`] with an isolated
//! environment, so user-level git config cannot change the output format.

use crate::core::error::{GitError, RelayError, RelayResult};
use crate::core::process::{CommandSpec, ProcessOutput, ProcessRunner};
use std::path::{Path, PathBuf};

/// Git backend using system git
pub struct SystemGit<'a> {
  /// Repository working directory
  repo_path: PathBuf,
  runner: &'a dyn ProcessRunner,
}

impl<'a> SystemGit<'a> {
  /// Bind to a repository path. Nothing is spawned until a query runs.
  pub fn new(path: &Path, runner: &'a dyn ProcessRunner) -> Self {
    Self {
      repo_path: path.to_path_buf(),
      runner,
    }
  }

  /// Paths with pending changes, tracked or untracked
  ///
  /// Returns the path column of `git status --porcelain`; renames report the
  /// destination. An empty list means the worktree is clean.
  pub fn status_porcelain(&self) -> RelayResult<Vec<String>> {
    let output = self.run(&["status", "--porcelain", "--untracked-files=all"])?;
    Ok(parse_porcelain(&output.stdout))
  }

  /// Untracked paths matched by the ignore rules, relative to the repo root
  ///
  /// Fully ignored directories are reported once (trailing slash stripped)
  /// rather than file by file.
  pub fn ignored_paths(&self) -> RelayResult<Vec<PathBuf>> {
    let output = self.run(&["ls-files", "--others", "--ignored", "--exclude-standard", "--directory"])?;
    Ok(
      output
        .stdout
        .lines()
        .map(|l| l.trim().trim_end_matches('/'))
        .filter(|l| !l.is_empty())
        .map(git_path_to_native)
        .collect(),
    )
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> RelayResult<String> {
    let output = self.run(&["rev-parse", "HEAD"])?;
    Ok(output.stdout.trim().to_string())
  }

  /// Get current branch name, falling back to the abbreviated HEAD ref when
  /// detached
  pub fn current_branch(&self) -> RelayResult<String> {
    let output = self.run(&["branch", "--show-current"])?;
    let branch = output.stdout.trim();
    if !branch.is_empty() {
      return Ok(branch.to_string());
    }

    let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(output.stdout.trim().to_string())
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Runs against the repo path via `-C`
  /// - Clears environment variables, whitelisting PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> CommandSpec {
    CommandSpec::new("git")
      .arg("-C")
      .arg(self.repo_path.to_string_lossy())
      .args(["-c", "core.quotePath=false"])
      .args(["-c", "color.status=false"])
      .isolated()
  }

  fn run(&self, args: &[&str]) -> RelayResult<ProcessOutput> {
    let spec = self.git_cmd().args(args.iter().copied());
    let output = self.runner.run(&spec)?;

    if !output.success() {
      if output.stderr.contains("not a git repository") {
        return Err(RelayError::Git(GitError::RepoNotFound {
          path: self.repo_path.clone(),
        }));
      }
      return Err(RelayError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: output.stderr.trim().to_string(),
      }));
    }

    Ok(output)
  }
}

/// Extract the path column from `git status --porcelain` (v1) output
fn parse_porcelain(stdout: &str) -> Vec<String> {
  stdout
    .lines()
    .filter(|line| line.len() > 3)
    .map(|line| {
      let path = &line[3..];
      match path.split_once(" -> ") {
        Some((_, to)) => to.to_string(),
        None => path.to_string(),
      }
    })
    .collect()
}

/// Convert a git-format path (always forward slashes) to a native path
fn git_path_to_native(path: &str) -> PathBuf {
  #[cfg(target_os = "windows")]
  {
    PathBuf::from(path.replace('/', "\\"))
  }
  #[cfg(not(target_os = "windows"))]
  {
    PathBuf::from(path)
  }
}
