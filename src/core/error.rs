//! Error types for cargo-relay with contextual messages and exit codes
//!
//! Every pipeline stage fails with a [`StageError`], which maps onto a
//! stage-specific process exit code so calling automation can tell causes
//! apart without parsing text. Ambient failures (configuration, git plumbing,
//! I/O) get their own categories.

use crate::core::repository::RepoRole;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure exit codes for cargo-relay; a run that reaches `Done` exits 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git plumbing, I/O)
  System = 2,
  /// Required external tool missing from the host
  Tooling = 10,
  /// Repository missing, unreadable, or dirty
  Worktree = 20,
  /// Test suite failed
  Test = 30,
  /// Compiler/build failed
  Build = 40,
  /// Exporter or compile-info materialization failed
  Export = 50,
  /// Installer packaging failed
  Packaging = 60,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-relay
#[derive(Debug, Error)]
pub enum RelayError {
  /// Configuration errors
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// Git plumbing errors
  #[error(transparent)]
  Git(#[from] GitError),

  /// A pipeline stage failed
  #[error(transparent)]
  Stage(#[from] StageError),

  /// I/O errors
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  /// Generic error with message and optional context
  #[error("{}", render_message(.message, .context))]
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

fn render_message(message: &str, context: &Option<String>) -> String {
  match context {
    Some(ctx) => format!("{}\n{}", message, ctx),
    None => message.to_string(),
  }
}

impl RelayError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RelayError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RelayError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RelayError::Message { message, context, help } => RelayError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RelayError::Io(e) => RelayError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", e)),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RelayError::Config(_) => ExitCode::User,
      RelayError::Git(_) => ExitCode::System,
      RelayError::Stage(e) => e.exit_code(),
      RelayError::Io(_) => ExitCode::System,
      RelayError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RelayError::Config(e) => e.help_message(),
      RelayError::Git(e) => e.help_message(),
      RelayError::Stage(e) => e.help_message(),
      RelayError::Message { help, .. } => help.clone(),
      RelayError::Io(_) => None,
    }
  }
}

impl From<String> for RelayError {
  fn from(msg: String) -> Self {
    RelayError::message(msg)
  }
}

impl From<&str> for RelayError {
  fn from(msg: &str) -> Self {
    RelayError::message(msg)
  }
}

impl From<toml_edit::TomlError> for RelayError {
  fn from(err: toml_edit::TomlError) -> Self {
    RelayError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for RelayError {
  fn from(err: toml_edit::de::Error) -> Self {
    RelayError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<cargo_metadata::Error> for RelayError {
  fn from(err: cargo_metadata::Error) -> Self {
    RelayError::message(format!("Cargo metadata error: {}", err))
  }
}

impl From<serde_json::Error> for RelayError {
  fn from(err: serde_json::Error) -> Self {
    RelayError::message(format!("JSON error: {}", err))
  }
}

impl From<walkdir::Error> for RelayError {
  fn from(err: walkdir::Error) -> Self {
    RelayError::message(format!("Directory walk error: {}", err))
  }
}

/// Errors raised by pipeline stages. Each one aborts the run.
#[derive(Debug, Clone, Error)]
pub enum StageError {
  /// A required external tool is not installed
  #[error("Required tool `{tool}` is not installed or not on PATH")]
  ToolNotInstalled { tool: String },

  /// Repository path does not exist
  #[error("Repository not found: {}", .path.display())]
  RepositoryNotFound { path: PathBuf },

  /// `git status` could not be queried
  #[error("Could not query status of {}: {stderr}", .path.display())]
  StatusQueryError { path: PathBuf, stderr: String },

  /// Worktree has pending changes
  #[error("{role} repository at {} has {} uncommitted change(s):\n{}", .path.display(), .changed.len(), format_changed(.changed))]
  DirtyWorktree {
    role: RepoRole,
    path: PathBuf,
    changed: Vec<String>,
  },

  /// Test suite exited non-zero
  #[error("{role} test suite failed with exit code {exit_code}")]
  TestFailure { role: RepoRole, exit_code: i32 },

  /// Build exited non-zero
  #[error("Build failed with exit code {exit_code}")]
  BuildFailure { exit_code: i32 },

  /// Compile-info template is missing
  #[error("Compile-info template not found: {}", .path.display())]
  TemplateNotFound { path: PathBuf },

  /// Destination not writable
  #[error("Failed to write {}: {reason}", .path.display())]
  WriteError { path: PathBuf, reason: String },

  /// Exporter tool failed
  #[error("Export failed: {reason}")]
  ExportFailure { reason: String },

  /// Installer packaging failed
  #[error("Packaging failed: {reason}")]
  PackagingFailure { reason: String },
}

fn format_changed(changed: &[String]) -> String {
  changed.iter().map(|p| format!("  {}", p)).collect::<Vec<_>>().join("\n")
}

impl StageError {
  /// Stable name of the failure category, used in reports
  pub fn kind(&self) -> &'static str {
    match self {
      StageError::ToolNotInstalled { .. } => "ToolNotInstalled",
      StageError::RepositoryNotFound { .. } => "RepositoryNotFound",
      StageError::StatusQueryError { .. } => "StatusQueryError",
      StageError::DirtyWorktree { .. } => "DirtyWorktree",
      StageError::TestFailure { .. } => "TestFailure",
      StageError::BuildFailure { .. } => "BuildFailure",
      StageError::TemplateNotFound { .. } => "TemplateNotFound",
      StageError::WriteError { .. } => "WriteError",
      StageError::ExportFailure { .. } => "ExportFailure",
      StageError::PackagingFailure { .. } => "PackagingFailure",
    }
  }

  pub fn exit_code(&self) -> ExitCode {
    match self {
      StageError::ToolNotInstalled { .. } => ExitCode::Tooling,
      StageError::RepositoryNotFound { .. } | StageError::StatusQueryError { .. } | StageError::DirtyWorktree { .. } => {
        ExitCode::Worktree
      }
      StageError::TestFailure { .. } => ExitCode::Test,
      StageError::BuildFailure { .. } => ExitCode::Build,
      StageError::TemplateNotFound { .. } | StageError::WriteError { .. } | StageError::ExportFailure { .. } => {
        ExitCode::Export
      }
      StageError::PackagingFailure { .. } => ExitCode::Packaging,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      StageError::ToolNotInstalled { tool } => Some(format!(
        "Install `{}` or point [tooling]/[package] in relay.toml at its full path.",
        tool
      )),
      StageError::DirtyWorktree { .. } => {
        Some("Commit or stash the listed changes yourself; cargo-relay never does it for you.".to_string())
      }
      StageError::RepositoryNotFound { .. } => Some("Check [repositories] in relay.toml.".to_string()),
      StageError::TemplateNotFound { .. } => {
        Some("Check [compile_info] template in relay.toml or restore the template file.".to_string())
      }
      _ => None,
    }
  }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
  /// relay.toml not found
  #[error("No cargo-relay configuration found.\nExpected file: {}/relay.toml", .search_root.display())]
  NotFound { search_root: PathBuf },

  /// Missing required field
  #[error("Missing required field in config: {field}")]
  MissingField { field: String },

  /// Field present but unusable
  #[error("Invalid value for `{field}`: {reason}")]
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create relay.toml with at least:\n  [repositories]\n  core = \"../core\"".to_string())
      }
      ConfigError::MissingField { field } => Some(format!("Add `{}` to relay.toml.", field)),
      ConfigError::Invalid { .. } => None,
    }
  }
}

/// Git operation errors
#[derive(Debug, Error)]
pub enum GitError {
  /// Git command failed
  #[error("Git command failed: {command}\n{stderr}")]
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  #[error("Git repository not found at: {}", .path.display())]
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Initialize the repository first or check the path: {}",
        path.display()
      )),
      GitError::CommandFailed { .. } => None,
    }
  }
}

/// Result type alias for cargo-relay
pub type RelayResult<T> = Result<T, RelayError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RelayResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RelayError>,
{
  fn with_context<F>(self, f: F) -> RelayResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RelayError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
