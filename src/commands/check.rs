use crate::commands::load_config;
use crate::core::config::GuardScope;
use crate::core::error::{RelayResult, StageError};
use crate::core::process::SystemRunner;
use crate::pipeline::worktree::{WorktreeGuard, WorktreeStatus};

/// Verify the configured repositories have no uncommitted changes
///
/// Reports every repository before failing, unlike the pipeline which stops
/// at the first dirty one.
pub fn run_check(frontend_only: bool) -> RelayResult<()> {
  let config = load_config()?;
  let runner = SystemRunner::captured();
  let guard = WorktreeGuard::new(&runner).ignoring(config.owned_paths());

  let mut repositories = vec![config.frontend()];
  if !frontend_only && config.guard.scope == GuardScope::Both {
    repositories.push(config.core());
  }

  let mut first_dirty = None;
  for repository in &repositories {
    match guard.check(repository)? {
      WorktreeStatus::Clean => println!("✅ {:<9} {}", repository.role, repository.path.display()),
      WorktreeStatus::Dirty(changed) => {
        println!(
          "❌ {:<9} {} ({} change(s))",
          repository.role,
          repository.path.display(),
          changed.len()
        );
        for path in &changed {
          println!("     {}", path);
        }
        if first_dirty.is_none() {
          first_dirty = Some(StageError::DirtyWorktree {
            role: repository.role,
            path: repository.path.clone(),
            changed,
          });
        }
      }
    }
  }

  match first_dirty {
    Some(err) => Err(err.into()),
    None => Ok(()),
  }
}
