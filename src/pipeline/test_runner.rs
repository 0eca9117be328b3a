//! Cross-repository test execution
//!
//! Core runs strictly before frontend: the frontend consumes the core
//! library's interface, so a core regression is reported before frontend
//! noise can hide it. Pass/fail is the process exit status and nothing else.

use crate::core::error::{RelayResult, StageError};
use crate::core::process::{CommandSpec, ProcessRunner};
use crate::core::repository::Repository;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
  Pass,
  Fail(i32),
}

pub struct CrossRepoTestRunner<'a> {
  runner: &'a dyn ProcessRunner,
  command: &'a [String],
}

impl<'a> CrossRepoTestRunner<'a> {
  pub fn new(runner: &'a dyn ProcessRunner, command: &'a [String]) -> Self {
    Self { runner, command }
  }

  /// Run the full test suite of one repository
  pub fn run(&self, repository: &Repository) -> RelayResult<TestOutcome> {
    let spec = CommandSpec::from_argv(self.command)?.current_dir(&repository.path);
    info!(role = %repository.role, command = %spec, "running test suite");

    let outcome = match self.runner.run(&spec) {
      Ok(output) if output.success() => TestOutcome::Pass,
      Ok(output) => TestOutcome::Fail(output.exit_code),
      Err(e) => {
        warn!(role = %repository.role, error = %e, "test runner could not be started");
        TestOutcome::Fail(-1)
      }
    };
    Ok(outcome)
  }

  /// Run `repository`'s suite and turn a failure into a stage error
  pub fn require_pass(&self, repository: &Repository) -> RelayResult<()> {
    match self.run(repository)? {
      TestOutcome::Pass => Ok(()),
      TestOutcome::Fail(exit_code) => Err(
        StageError::TestFailure {
          role: repository.role,
          exit_code,
        }
        .into(),
      ),
    }
  }
}
