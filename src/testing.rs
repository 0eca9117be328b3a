//! Test doubles shared by unit tests

use crate::core::error::RelayResult;
use crate::core::process::{CommandSpec, ProcessOutput, ProcessRunner};
use crate::pipeline::build::{ForceBuildToken, TokenSource};
use crate::pipeline::visibility::HiddenAttribute;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

type SideEffect = Box<dyn Fn(&CommandSpec)>;

struct Rule {
  needles: Vec<String>,
  output: ProcessOutput,
  effect: Option<SideEffect>,
}

impl Rule {
  fn matches(&self, spec: &CommandSpec) -> bool {
    self
      .needles
      .iter()
      .all(|n| &spec.program == n || spec.args.iter().any(|a| a == n))
  }
}

/// Scripted [`ProcessRunner`] that records every invocation
///
/// Unmatched commands succeed with empty output. A command matches a rule when
/// every needle of the rule equals its program or one of its arguments; rules
/// added later take precedence.
#[derive(Default)]
pub struct FakeRunner {
  rules: Vec<Rule>,
  missing: Vec<String>,
  echo: bool,
  calls: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn on(self, needle: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
    self.on_all(&[needle], exit_code, stdout, stderr)
  }

  pub fn on_all(mut self, needles: &[&str], exit_code: i32, stdout: &str, stderr: &str) -> Self {
    self.rules.push(Rule {
      needles: needles.iter().map(|n| n.to_string()).collect(),
      output: ProcessOutput {
        exit_code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
      },
      effect: None,
    });
    self
  }

  /// Like [`FakeRunner::on`] but also runs `effect` (e.g. to create an output file)
  pub fn on_run(mut self, needle: &str, exit_code: i32, effect: impl Fn(&CommandSpec) + 'static) -> Self {
    self.rules.push(Rule {
      needles: vec![needle.to_string()],
      output: ProcessOutput {
        exit_code,
        ..Default::default()
      },
      effect: Some(Box::new(effect)),
    });
    self
  }

  /// Drop stdout of calls that did not ask for capture, like an echoing `SystemRunner`
  pub fn echoing(mut self) -> Self {
    self.echo = true;
    self
  }

  /// Report `program` as not installed
  pub fn without(mut self, program: &str) -> Self {
    self.missing.push(program.to_string());
    self
  }

  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.borrow().clone()
  }

  /// Whether any recorded call matches `needle` (program or argument)
  pub fn invoked(&self, needle: &str) -> bool {
    self.count(needle) > 0
  }

  pub fn count(&self, needle: &str) -> usize {
    self
      .calls
      .borrow()
      .iter()
      .filter(|c| c.program == needle || c.args.iter().any(|a| a == needle))
      .count()
  }

  /// Calls whose working directory is `dir`
  pub fn calls_in(&self, dir: &Path) -> Vec<CommandSpec> {
    self
      .calls
      .borrow()
      .iter()
      .filter(|c| c.cwd.as_deref() == Some(dir))
      .cloned()
      .collect()
  }
}

impl ProcessRunner for FakeRunner {
  fn run(&self, spec: &CommandSpec) -> RelayResult<ProcessOutput> {
    self.calls.borrow_mut().push(spec.clone());
    match self.rules.iter().rev().find(|r| r.matches(spec)) {
      Some(rule) => {
        if let Some(effect) = &rule.effect {
          effect(spec);
        }
        let mut output = rule.output.clone();
        if self.echo && !spec.capture {
          output.stdout.clear();
          output.stderr.clear();
        }
        Ok(output)
      }
      None => Ok(ProcessOutput::default()),
    }
  }

  fn is_available(&self, program: &str) -> bool {
    !self.missing.iter().any(|m| m == program)
  }
}

/// In-memory [`HiddenAttribute`] backend
#[derive(Default)]
pub struct MemoryAttributes {
  hidden: Mutex<BTreeSet<PathBuf>>,
  failing: Mutex<Vec<PathBuf>>,
  writes: AtomicUsize,
}

impl MemoryAttributes {
  pub fn mark_hidden(&self, path: PathBuf) {
    self.hidden.lock().unwrap().insert(path);
  }

  /// Make `set_hidden` fail for `path`
  pub fn fail_on(&self, path: PathBuf) {
    self.failing.lock().unwrap().push(path);
  }

  pub fn hidden(&self, path: &Path) -> bool {
    self.hidden.lock().unwrap().contains(path)
  }

  pub fn snapshot(&self) -> BTreeSet<PathBuf> {
    self.hidden.lock().unwrap().clone()
  }

  /// Number of `set_hidden` calls so far
  pub fn touched(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }
}

impl HiddenAttribute for MemoryAttributes {
  fn is_hidden(&self, path: &Path) -> io::Result<bool> {
    Ok(self.hidden(path))
  }

  fn set_hidden(&self, path: &Path, hidden: bool) -> io::Result<()> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    if self.failing.lock().unwrap().iter().any(|p| p == path) {
      return Err(io::Error::other("attribute change rejected"));
    }
    let mut set = self.hidden.lock().unwrap();
    if hidden {
      set.insert(path.to_path_buf());
    } else {
      set.remove(path);
    }
    Ok(())
  }
}

/// Token source yielding `token-1`, `token-2`, ...
#[derive(Default)]
pub struct SequentialTokens(Cell<u64>);

impl TokenSource for SequentialTokens {
  fn next_token(&self) -> ForceBuildToken {
    let next = self.0.get() + 1;
    self.0.set(next);
    ForceBuildToken::new(format!("token-{}", next))
  }
}
