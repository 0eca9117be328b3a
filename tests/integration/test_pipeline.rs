//! End-to-end runs of `cargo relay run`
#![cfg(unix)]

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_release_run_reaches_done() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = run_cargo_relay(&fx.frontend, &["relay", "run", "--json"])?;
  let report = stdout_json(&output)?;

  assert_eq!(report["final_state"]["state"], "Done");
  assert_eq!(report["mode"], "release");
  let stages = report["stages"].as_array().unwrap();
  assert_eq!(stages.len(), 8);
  assert!(stages.iter().all(|s| s["status"] == "success"));

  // core strictly before frontend
  assert_eq!(fx.tests_log(), vec!["core", "frontend"]);

  // compile-info carries the manifest version and the build token
  let info = std::fs::read_to_string(fx.compile_info())?;
  assert!(info.contains("VERSION: &str = \"1.2.0\""));
  let token = std::fs::read_to_string(fx.frontend.join("target/release/relay-cli"))?;
  assert!(info.contains(&format!("BUILD_ID: &str = \"{}\"", token.trim())));

  // exporter staged the binary, packager produced the installer
  assert!(fx.frontend.join(".temp/publish/bin/relay-cli").exists());
  assert!(fx.installer().exists());
  assert_eq!(
    report["artifacts"]["installer"].as_str(),
    Some(fx.installer().to_string_lossy().as_ref())
  );
  Ok(())
}

#[test]
fn test_dirty_frontend_aborts_at_guard() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::write(fx.frontend.join("src/main.rs"), "fn main() { println!(\"wip\"); }\n")?;

  let output = relay(&fx.frontend, &["relay", "run", "--json"])?;
  assert_eq!(output.status.code(), Some(20));

  let report = stdout_json(&output)?;
  assert_eq!(report["final_state"]["state"], "Aborted");
  assert_eq!(report["final_state"]["stage"], "GuardingWorktrees");
  assert_eq!(report["final_state"]["reason"]["kind"], "DirtyWorktree");

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("src/main.rs"), "stderr should list the change: {stderr}");

  assert!(fx.tests_log().is_empty());
  assert!(!fx.frontend.join("target").exists());
  assert!(!fx.compile_info().exists());
  Ok(())
}

#[test]
fn test_dirty_core_passes_with_frontend_only() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::write(fx.core.join("scratch.txt"), "notes")?;

  let strict = relay(&fx.frontend, &["relay", "run", "--json"])?;
  assert_eq!(strict.status.code(), Some(20));

  run_cargo_relay(&fx.frontend, &["relay", "run", "--json", "--frontend-only"])?;
  assert!(fx.installer().exists());
  Ok(())
}

#[test]
fn test_core_failure_never_runs_frontend_tests() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::write(fx.core.join("FAIL"), "")?;
  commit_all(&fx.core, "Break core")?;

  let output = relay(&fx.frontend, &["relay", "run", "--json"])?;
  assert_eq!(output.status.code(), Some(30));
  assert_eq!(fx.tests_log(), vec!["core"]);

  let report = stdout_json(&output)?;
  assert_eq!(report["final_state"]["stage"], "TestingCore");
  assert!(!fx.frontend.join("target").exists());
  Ok(())
}

#[test]
fn test_build_failure_leaves_compile_info_alone() -> Result<()> {
  let fx = ReleaseFixture::with_overrides(&[("build.command", r#"["sh", "-c", "exit 7"]"#)])?;

  let output = relay(&fx.frontend, &["relay", "run", "--json"])?;
  assert_eq!(output.status.code(), Some(40));

  let report = stdout_json(&output)?;
  assert_eq!(report["final_state"]["reason"]["kind"], "BuildFailure");
  assert!(!fx.compile_info().exists());
  assert!(!fx.installer().exists());
  Ok(())
}

#[test]
fn test_terminal_run_stamps_real_toolchain() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  // without --json, child output streams to the terminal
  let output = run_cargo_relay(&fx.frontend, &["relay", "run"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Done"));

  let info = std::fs::read_to_string(fx.compile_info())?;
  assert!(!info.contains("PLATFORM: &str = \"Unknown\""), "{}", info);
  assert!(!info.contains("TOOLCHAIN: &str = \"unknown"), "{}", info);
  assert!(info.contains("TOOLCHAIN: &str = \"rustc "), "{}", info);
  Ok(())
}

#[test]
fn test_first_run_without_ignored_marker_dir() -> Result<()> {
  let fx = ReleaseFixture::with_gitignore("target/\ndist/\nsrc/data/compile_info.rs\n.temp/publish/\n")?;

  let output = run_cargo_relay(&fx.frontend, &["relay", "run", "--json"])?;
  let report = stdout_json(&output)?;
  assert_eq!(report["final_state"]["state"], "Done");
  assert!(fx.frontend.join(".temp/last_visibility_check").exists());

  // the marker stays out of `check` as well
  run_cargo_relay(&fx.frontend, &["relay", "check"])?;
  Ok(())
}

#[test]
fn test_missing_packager_fails_before_tests() -> Result<()> {
  let fx = ReleaseFixture::with_overrides(&[("packager", "\"definitely-not-iscc-5c1e\"")])?;

  let output = relay(&fx.frontend, &["relay", "run"])?;
  assert_eq!(output.status.code(), Some(10));
  assert!(String::from_utf8_lossy(&output.stderr).contains("definitely-not-iscc-5c1e"));
  assert!(fx.tests_log().is_empty());
  Ok(())
}

#[test]
fn test_debug_run_removes_compile_info() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::create_dir_all(fx.frontend.join("src/data"))?;
  std::fs::write(fx.compile_info(), "stale")?;

  let output = run_cargo_relay(&fx.frontend, &["relay", "run", "--mode", "debug", "--json"])?;
  let report = stdout_json(&output)?;
  assert_eq!(report["final_state"]["state"], "Done");
  assert_eq!(report["artifacts"]["compile_info"]["policy"], "cleared");
  assert!(!fx.compile_info().exists());
  Ok(())
}

#[test]
fn test_second_run_debounces_visibility() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  run_cargo_relay(&fx.frontend, &["relay", "run", "--json"])?;
  let output = run_cargo_relay(&fx.frontend, &["relay", "run", "--json"])?;
  let report = stdout_json(&output)?;

  let hiding = report["stages"]
    .as_array()
    .unwrap()
    .iter()
    .find(|s| s["stage"] == "HidingArtifacts")
    .unwrap()
    .clone();
  assert_eq!(hiding["status"], "skipped");
  assert!(hiding["detail"].as_str().unwrap().starts_with("debounced"));
  Ok(())
}
