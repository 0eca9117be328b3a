//! Tests for `check` and `status`
#![cfg(unix)]

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_check_clean_repositories() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  let output = run_cargo_relay(&fx.frontend, &["relay", "check"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("frontend"));
  assert!(stdout.contains("core"));
  Ok(())
}

#[test]
fn test_check_lists_dirty_core_paths() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::write(fx.core.join("src/lib.rs"), "pub fn answer() -> u32 { 41 }\n")?;

  let output = relay(&fx.frontend, &["relay", "check"])?;
  assert_eq!(output.status.code(), Some(20));
  assert!(String::from_utf8_lossy(&output.stdout).contains("src/lib.rs"));

  run_cargo_relay(&fx.frontend, &["relay", "check", "--frontend-only"])?;
  Ok(())
}

#[test]
fn test_missing_core_repository() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::remove_dir_all(&fx.core)?;

  let output = relay(&fx.frontend, &["relay", "check"])?;
  assert_eq!(output.status.code(), Some(20));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Repository not found"));
  Ok(())
}

#[test]
fn test_missing_config_is_user_error() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = relay(dir.path(), &["relay", "check"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("relay.toml"));
  Ok(())
}

#[test]
fn test_status_json_reports_both_repositories() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  let output = run_cargo_relay(&fx.frontend, &["relay", "status", "--json"])?;
  let statuses = stdout_json(&output)?;
  let statuses = statuses.as_array().unwrap();
  assert_eq!(statuses.len(), 2);
  assert_eq!(statuses[0]["role"], "frontend");
  assert_eq!(statuses[1]["role"], "core");
  for status in statuses {
    assert_eq!(status["branch"], "main");
    assert_eq!(status["clean"], true);
    assert_eq!(status["commit"].as_str().map(str::len), Some(40));
  }
  Ok(())
}
