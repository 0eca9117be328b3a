//! Worktree cleanliness guard
//!
//! A release must be built from committed sources only. Status is queried
//! fresh on every call; nothing is cached between runs.

use crate::core::config::join_clean;
use crate::core::error::{GitError, RelayError, RelayResult, StageError};
use crate::core::process::ProcessRunner;
use crate::core::repository::Repository;
use crate::core::vcs::SystemGit;
use std::path::{Path, PathBuf};

/// Outcome of inspecting one worktree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorktreeStatus {
  Clean,
  Dirty(Vec<String>),
}

impl WorktreeStatus {
  pub fn is_clean(&self) -> bool {
    matches!(self, WorktreeStatus::Clean)
  }

  pub fn into_changed(self) -> Vec<String> {
    match self {
      WorktreeStatus::Clean => Vec::new(),
      WorktreeStatus::Dirty(changed) => changed,
    }
  }
}

/// Read-only inspection of repository worktrees
pub struct WorktreeGuard<'a> {
  runner: &'a dyn ProcessRunner,
  /// Files cargo-relay writes itself; never count as pending changes
  ignored: Vec<PathBuf>,
}

impl<'a> WorktreeGuard<'a> {
  pub fn new(runner: &'a dyn ProcessRunner) -> Self {
    Self {
      runner,
      ignored: Vec::new(),
    }
  }

  /// Skip these absolute paths when they show up as changes
  pub fn ignoring(mut self, paths: Vec<PathBuf>) -> Self {
    self.ignored = paths;
    self
  }

  /// Query tracked and untracked changes of `repository`
  pub fn check(&self, repository: &Repository) -> Result<WorktreeStatus, StageError> {
    if !repository.path.exists() {
      return Err(StageError::RepositoryNotFound {
        path: repository.path.clone(),
      });
    }

    let git = SystemGit::new(&repository.path, self.runner);
    let changed = git.status_porcelain().map_err(|e| StageError::StatusQueryError {
      path: repository.path.clone(),
      stderr: describe(e),
    })?;
    let changed: Vec<String> = changed
      .into_iter()
      .filter(|p| !self.is_ignored(&repository.path, p))
      .collect();

    if changed.is_empty() {
      Ok(WorktreeStatus::Clean)
    } else {
      Ok(WorktreeStatus::Dirty(changed))
    }
  }

  fn is_ignored(&self, root: &Path, changed: &str) -> bool {
    let path = join_clean(root, Path::new(changed));
    self.ignored.iter().any(|ignored| *ignored == path)
  }

  /// Check each repository in order, failing on the first dirty one
  pub fn require_clean(&self, repositories: &[Repository]) -> RelayResult<()> {
    for repository in repositories {
      if let WorktreeStatus::Dirty(changed) = self.check(repository)? {
        return Err(
          StageError::DirtyWorktree {
            role: repository.role,
            path: repository.path.clone(),
            changed,
          }
          .into(),
        );
      }
      tracing::debug!(role = %repository.role, path = %repository.path.display(), "worktree clean");
    }
    Ok(())
  }
}

fn describe(err: RelayError) -> String {
  match err {
    RelayError::Git(GitError::RepoNotFound { .. }) => "not a git repository".to_string(),
    RelayError::Git(GitError::CommandFailed { stderr, .. }) => stderr,
    other => other.to_string(),
  }
}
