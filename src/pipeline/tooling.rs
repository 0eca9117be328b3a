//! Host tooling gate
//!
//! Runs before anything with side effects so a missing installer compiler is
//! reported up front instead of after a full test-and-build cycle.

use crate::core::error::{RelayResult, StageError};
use crate::core::process::ProcessRunner;
use tracing::debug;

pub struct ToolingCheck<'a> {
  runner: &'a dyn ProcessRunner,
}

impl<'a> ToolingCheck<'a> {
  pub fn new(runner: &'a dyn ProcessRunner) -> Self {
    Self { runner }
  }

  /// Fail with `ToolNotInstalled` on the first program that cannot be found
  pub fn require<'t>(&self, tools: impl IntoIterator<Item = &'t str>) -> RelayResult<()> {
    for tool in tools {
      if !self.runner.is_available(tool) {
        return Err(StageError::ToolNotInstalled { tool: tool.to_string() }.into());
      }
      debug!(tool, "tool available");
    }
    Ok(())
  }
}
