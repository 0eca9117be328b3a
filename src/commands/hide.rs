use crate::commands::{load_config, print_json};
use crate::core::clock::SystemClock;
use crate::core::error::RelayResult;
use crate::core::process::SystemRunner;
use crate::pipeline::visibility::{VisibilityManager, VisibilityOutcome, platform_attributes};

/// Apply hidden attributes in the frontend repository
pub fn run_hide(force: bool, json: bool) -> RelayResult<()> {
  let config = load_config()?;
  let runner = SystemRunner::captured();
  let attributes = platform_attributes();
  let clock = SystemClock;

  let manager = VisibilityManager::new(&config.visibility, &runner, attributes.as_ref(), &clock);
  let outcome = manager.apply(&config.frontend_root(), force)?;

  if json {
    return print_json(&outcome);
  }

  match outcome {
    VisibilityOutcome::Applied(summary) => {
      println!(
        "👁️  Scanned {} path(s): {} hidden, {} unhidden",
        summary.scanned, summary.hidden, summary.unhidden
      );
      if summary.failures > 0 {
        println!("⚠️  {} path(s) could not be updated (see log)", summary.failures);
      }
    }
    VisibilityOutcome::Skipped(reason) => println!("⏭️  Visibility scan skipped: {}", reason),
  }
  Ok(())
}
