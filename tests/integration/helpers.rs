//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const COMPILE_INFO_TEMPLATE: &str = r#"pub const VERSION: &str = "{version}";
pub const DATE: &str = "{date}";
pub const PLATFORM: &str = "{platform}";
pub const TOOLCHAIN: &str = "{toolchain}";
pub const BUILD_ID: &str = "{build_id}";
"#;

/// Appends the repository it runs in to `<root>/tests.log`; fails when a `FAIL` file exists
pub const TEST_COMMAND: &str = r#"["sh", "-c", 'basename "$PWD" >> ../tests.log; test ! -f FAIL']"#;

/// Writes the force-build token into the "binary" so tests can inspect it
pub const BUILD_COMMAND: &str =
  r#"["sh", "-c", 'test -n "$FORCE_BUILD" && mkdir -p target/release target/debug && echo "$FORCE_BUILD" > target/release/relay-cli && cp target/release/relay-cli target/debug/relay-cli']"#;

const DEFAULT_GITIGNORE: &str = ".temp/\ntarget/\ndist/\nsrc/data/compile_info.rs\n";

/// A frontend and a core repository side by side, both committed and clean
///
/// ```text
/// <root>/
///   frontend/   relay.toml, Cargo.toml, templates/, scripts/setup.iss
///   core/       Cargo.toml, src/lib.rs
///   bin/iscc    fake installer compiler
/// ```
pub struct ReleaseFixture {
  _root: TempDir,
  pub root: PathBuf,
  pub frontend: PathBuf,
  pub core: PathBuf,
}

impl ReleaseFixture {
  pub fn new() -> Result<Self> {
    Self::with_overrides(&[])
  }

  /// Build the fixture, replacing relay.toml `key = value` lines (by key) with `overrides`
  pub fn with_overrides(overrides: &[(&str, &str)]) -> Result<Self> {
    Self::build(overrides, DEFAULT_GITIGNORE)
  }

  /// Build the fixture with a custom frontend `.gitignore`
  pub fn with_gitignore(gitignore: &str) -> Result<Self> {
    Self::build(&[], gitignore)
  }

  fn build(overrides: &[(&str, &str)], gitignore: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let root_path = root.path().to_path_buf();
    let frontend = root_path.join("frontend");
    let core = root_path.join("core");

    init_repo(&core)?;
    std::fs::create_dir_all(core.join("src"))?;
    std::fs::write(
      core.join("Cargo.toml"),
      "[package]\nname = \"relay-core\"\nversion = \"0.7.0\"\nedition = \"2021\"\n",
    )?;
    std::fs::write(core.join("src/lib.rs"), "pub fn answer() -> u32 { 42 }\n")?;
    commit_all(&core, "Initial core")?;

    let packager = write_fake_packager(&root_path)?;

    init_repo(&frontend)?;
    std::fs::create_dir_all(frontend.join("src"))?;
    std::fs::create_dir_all(frontend.join("templates"))?;
    std::fs::create_dir_all(frontend.join("scripts"))?;
    std::fs::write(
      frontend.join("Cargo.toml"),
      "[package]\nname = \"relay-cli\"\nversion = \"1.2.0\"\nedition = \"2021\"\nauthors = [\"Test Author\"]\nhomepage = \"https://example.com\"\n",
    )?;
    std::fs::write(frontend.join("src/main.rs"), "fn main() {}\n")?;
    std::fs::write(frontend.join("templates/compile_info.rs.template"), COMPILE_INFO_TEMPLATE)?;
    std::fs::write(frontend.join("scripts/setup.iss"), "[Setup]\nAppName=relay\n")?;
    std::fs::write(frontend.join(".gitignore"), gitignore)?;
    std::fs::write(frontend.join("relay.toml"), relay_toml(&packager, overrides))?;
    commit_all(&frontend, "Initial frontend")?;

    Ok(Self {
      _root: root,
      root: root_path,
      frontend,
      core,
    })
  }

  /// Repositories whose test suite ran, in order
  pub fn tests_log(&self) -> Vec<String> {
    std::fs::read_to_string(self.root.join("tests.log"))
      .map(|s| s.lines().map(String::from).collect())
      .unwrap_or_default()
  }

  pub fn compile_info(&self) -> PathBuf {
    self.frontend.join("src/data/compile_info.rs")
  }

  pub fn installer(&self) -> PathBuf {
    self.frontend.join("dist/setup.exe")
  }
}

fn relay_toml(packager: &Path, overrides: &[(&str, &str)]) -> String {
  let bin = env!("CARGO_BIN_EXE_cargo-relay");
  let lines = vec![
    ("[repositories]", String::new()),
    ("frontend", "\".\"".to_string()),
    ("core", "\"../core\"".to_string()),
    ("[visibility]", String::new()),
    ("debounce_secs", "600".to_string()),
    ("[test]", String::new()),
    ("test.command", TEST_COMMAND.to_string()),
    ("[build]", String::new()),
    ("build.command", BUILD_COMMAND.to_string()),
    ("binary", "\"relay-cli\"".to_string()),
    ("target_dir", "\"target\"".to_string()),
    ("[export]", String::new()),
    ("export.command", format!("[{:?}, \"relay\", \"export\"]", bin)),
    ("[package]", String::new()),
    ("packager", format!("{:?}", packager.to_string_lossy())),
    ("spec", "\"scripts/setup.iss\"".to_string()),
    ("installer", "\"dist/setup.exe\"".to_string()),
    ("[publish]", String::new()),
    ("binaries", "[\"relay-cli\"]".to_string()),
  ];

  let mut out = String::new();
  for (key, value) in lines {
    if key.starts_with('[') {
      out.push_str(&format!("\n{}\n", key));
      continue;
    }
    let value = overrides
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, v)| v.to_string())
      .unwrap_or(value);
    // section-qualified keys keep the bare field name in the file
    let field = key.rsplit('.').next().unwrap_or(key);
    out.push_str(&format!("{} = {}\n", field, value));
  }
  out
}

#[cfg(unix)]
fn write_fake_packager(root: &Path) -> Result<PathBuf> {
  use std::os::unix::fs::PermissionsExt;

  let dir = root.join("bin");
  std::fs::create_dir_all(&dir)?;
  let path = dir.join("iscc");
  std::fs::write(&path, "#!/bin/sh\nmkdir -p dist && cp \"$1\" dist/setup.exe\n")?;
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
  Ok(path)
}

#[cfg(not(unix))]
fn write_fake_packager(root: &Path) -> Result<PathBuf> {
  Ok(root.join("bin").join("iscc"))
}

fn init_repo(path: &Path) -> Result<()> {
  std::fs::create_dir_all(path)?;
  git(path, &["init", "--initial-branch=main"])?;
  git(path, &["config", "user.name", "Test User"])?;
  git(path, &["config", "user.email", "test@example.com"])?;
  Ok(())
}

/// Commit current changes, returning the new HEAD
pub fn commit_all(path: &Path, message: &str) -> Result<String> {
  git(path, &["add", "."])?;
  git(path, &["commit", "-m", message])?;

  let output = git(path, &["rev-parse", "HEAD"])?;
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run cargo-relay and return its output whatever the exit status
pub fn relay(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_cargo-relay"))
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run cargo-relay")
}

/// Run cargo-relay, failing unless it exits successfully
pub fn run_cargo_relay(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = relay(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "cargo-relay command failed: cargo {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Parse stdout as JSON
pub fn stdout_json(output: &Output) -> Result<serde_json::Value> {
  serde_json::from_slice(&output.stdout).context("stdout is not valid JSON")
}
