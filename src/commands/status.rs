use serde::Serialize;
use std::path::PathBuf;

use crate::commands::{load_config, print_json};
use crate::core::error::RelayResult;
use crate::core::process::SystemRunner;
use crate::core::repository::{RepoRole, Repository};
use crate::core::vcs::SystemGit;
use crate::pipeline::worktree::WorktreeGuard;

/// Status information for a single repository
#[derive(Debug, Clone, Serialize)]
pub struct RepoStatus {
  pub role: RepoRole,
  pub path: PathBuf,
  pub exists: bool,
  /// `None` when status could not be queried
  pub clean: Option<bool>,
  pub changed: Vec<String>,
  pub branch: Option<String>,
  pub commit: Option<String>,
}

/// Run the status command
pub fn run_status(json: bool) -> RelayResult<()> {
  let config = load_config()?;
  let runner = SystemRunner::captured();

  let statuses: Vec<RepoStatus> = [config.frontend(), config.core()]
    .iter()
    .map(|repo| inspect(repo, &runner, config.owned_paths()))
    .collect();

  if json {
    print_json(&statuses)
  } else {
    print_status_table(&statuses);
    Ok(())
  }
}

fn inspect(repository: &Repository, runner: &SystemRunner, owned: Vec<PathBuf>) -> RepoStatus {
  let exists = repository.path.exists();
  let (clean, changed) = match WorktreeGuard::new(runner).ignoring(owned).check(repository) {
    Ok(status) => (Some(status.is_clean()), status.into_changed()),
    Err(e) => {
      tracing::debug!(role = %repository.role, error = %e, "status unavailable");
      (None, Vec::new())
    }
  };

  let git = SystemGit::new(&repository.path, runner);
  let (branch, commit) = if exists {
    (git.current_branch().ok(), git.head_commit().ok())
  } else {
    (None, None)
  };

  RepoStatus {
    role: repository.role,
    path: repository.path.clone(),
    exists,
    clean,
    changed,
    branch,
    commit,
  }
}

/// Print status as a formatted table
fn print_status_table(statuses: &[RepoStatus]) {
  println!("\n📊 Repository Status\n");

  println!("{:<10} {:<20} {:<10} {:<10} PATH", "ROLE", "BRANCH", "HEAD", "STATE");
  println!("{:-<100}", "");

  for status in statuses {
    let state = match (status.exists, status.clean) {
      (false, _) => "missing".to_string(),
      (true, None) => "unknown".to_string(),
      (true, Some(true)) => "clean".to_string(),
      (true, Some(false)) => format!("dirty ({})", status.changed.len()),
    };
    let head = status
      .commit
      .as_deref()
      .map(|c| c.chars().take(8).collect::<String>())
      .unwrap_or_else(|| "-".to_string());

    println!(
      "{:<10} {:<20} {:<10} {:<10} {}",
      status.role.to_string(),
      status.branch.as_deref().unwrap_or("-"),
      head,
      state,
      status.path.display()
    );
  }
  println!();
}
