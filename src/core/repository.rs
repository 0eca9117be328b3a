//! Repositories the pipeline validates, tests, and builds

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Which side of the release a repository plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoRole {
  /// The versioned-storage engine consumed by the frontend
  Core,
  /// The command-line tool being released
  Frontend,
}

impl fmt::Display for RepoRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RepoRole::Core => write!(f, "core"),
      RepoRole::Frontend => write!(f, "frontend"),
    }
  }
}

/// A source tree taking part in the release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
  pub path: PathBuf,
  pub role: RepoRole,
}

impl Repository {
  pub fn new(path: impl Into<PathBuf>, role: RepoRole) -> Self {
    Self {
      path: path.into(),
      role,
    }
  }

  pub fn core(path: impl Into<PathBuf>) -> Self {
    Self::new(path, RepoRole::Core)
  }

  pub fn frontend(path: impl Into<PathBuf>) -> Self {
    Self::new(path, RepoRole::Frontend)
  }
}
