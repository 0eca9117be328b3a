//! Subprocess capability used for every external tool
//!
//! The pipeline never spawns processes directly: test runners, the compiler,
//! the exporter, the packager and git all go through [`ProcessRunner`], so the
//! sequencing logic can be exercised with a scripted runner in tests.

use crate::core::error::{RelayError, RelayResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// A fully described subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub env: Vec<(String, String)>,
  /// Start from an empty environment (only `env` and the PATH/HOME whitelist)
  pub isolated: bool,
  /// Caller parses stdout, so it is captured even by an echoing runner
  pub capture: bool,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: Vec::new(),
      isolated: false,
      capture: false,
    }
  }

  /// Build from an argv-style list (`["cargo", "test", "--workspace"]`)
  pub fn from_argv(argv: &[String]) -> RelayResult<Self> {
    let (program, args) = argv
      .split_first()
      .ok_or_else(|| RelayError::message("Command must not be empty"))?;
    Ok(Self::new(program.clone()).args(args.iter().cloned()))
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.push((key.into(), value.into()));
    self
  }

  pub fn isolated(mut self) -> Self {
    self.isolated = true;
    self.capture = true;
    self
  }

  pub fn capture_output(mut self) -> Self {
    self.capture = true;
    self
  }

  /// Value of an environment override, if set
  #[allow(dead_code)]
  pub fn env_value(&self, key: &str) -> Option<&str> {
    self.env.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// What a finished subprocess left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  /// Exit code, `-1` when the process was killed by a signal
  pub exit_code: i32,
  pub stdout: String,
  pub stderr: String,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }
}

/// Narrow capability for running external tools
pub trait ProcessRunner {
  /// Run to completion, blocking until exit
  fn run(&self, spec: &CommandSpec) -> RelayResult<ProcessOutput>;

  /// Whether `program` can be launched on this host
  fn is_available(&self, program: &str) -> bool {
    find_program(program).is_some()
  }
}

/// Runner backed by `std::process::Command`
pub struct SystemRunner {
  /// Stream child stdout/stderr to the terminal instead of capturing it
  echo: bool,
}

impl SystemRunner {
  /// Capture output (used for git plumbing and `--json` mode)
  pub fn captured() -> Self {
    Self { echo: false }
  }

  /// Let the child write straight to our terminal
  pub fn echoing() -> Self {
    Self { echo: true }
  }

  fn command(&self, spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);

    if let Some(cwd) = &spec.cwd {
      cmd.current_dir(cwd);
    }

    if spec.isolated {
      cmd.env_clear();
      if let Ok(path) = std::env::var("PATH") {
        cmd.env("PATH", path);
      }
      if let Ok(home) = std::env::var("HOME") {
        cmd.env("HOME", home);
      }
      // Windows needs these to locate system DLLs and temp dirs
      for key in ["SYSTEMROOT", "TEMP", "TMP", "USERPROFILE"] {
        if let Ok(value) = std::env::var(key) {
          cmd.env(key, value);
        }
      }
    }

    for (key, value) in &spec.env {
      cmd.env(key, value);
    }

    cmd
  }
}

impl ProcessRunner for SystemRunner {
  fn run(&self, spec: &CommandSpec) -> RelayResult<ProcessOutput> {
    debug!(command = %spec, cwd = ?spec.cwd, "spawning");
    let mut cmd = self.command(spec);

    let capture = !self.echo || spec.capture;

    if capture {
      let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| RelayError::message(format!("Failed to execute `{}`: {}", spec, e)))?;

      Ok(ProcessOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      })
    } else {
      let status = cmd
        .stdin(Stdio::null())
        .status()
        .map_err(|e| RelayError::message(format!("Failed to execute `{}`: {}", spec, e)))?;

      Ok(ProcessOutput {
        exit_code: status.code().unwrap_or(-1),
        ..Default::default()
      })
    }
  }
}

/// Resolve a program the way a shell would: explicit paths are checked
/// directly, bare names are searched on `PATH`.
pub fn find_program(program: &str) -> Option<PathBuf> {
  if program.is_empty() {
    return None;
  }

  let candidate = Path::new(program);
  if candidate.components().count() > 1 || candidate.is_absolute() {
    return candidate.is_file().then(|| candidate.to_path_buf());
  }

  let path = std::env::var_os("PATH")?;
  std::env::split_paths(&path).find_map(|dir| {
    executable_names(program)
      .into_iter()
      .map(|name| dir.join(name))
      .find(|p| p.is_file())
  })
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
  if Path::new(program).extension().is_some() {
    return vec![program.to_string()];
  }
  let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.BAT;.CMD;.COM".to_string());
  let mut names = vec![program.to_string()];
  names.extend(pathext.split(';').filter(|e| !e.is_empty()).map(|ext| format!("{}{}", program, ext)));
  names
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
  vec![program.to_string()]
}
