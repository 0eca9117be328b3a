//! Tests for the standalone `export`, `compile-info` and `hide` commands
#![cfg(unix)]

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_export_copies_binaries_and_extras() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::create_dir_all(fx.frontend.join("target/release"))?;
  std::fs::write(fx.frontend.join("target/release/relay-cli"), "binary")?;
  std::fs::write(fx.frontend.join("README.md"), "# relay\n")?;
  let mut config = std::fs::read_to_string(fx.frontend.join("relay.toml"))?;
  config.push_str(
    "\n[[publish.copies]]\nfrom = \"README.md\"\nto = \"README.md\"\n\n[[publish.copies]]\nfrom = \"setup.ps1\"\nto = \"setup.ps1\"\nplatforms = [\"windows\"]\n",
  );
  std::fs::write(fx.frontend.join("relay.toml"), config)?;

  let output = run_cargo_relay(&fx.frontend, &["relay", "export", "--json"])?;
  let report = stdout_json(&output)?;

  let publish = fx.frontend.join(".temp/publish");
  assert_eq!(std::fs::read_to_string(publish.join("bin/relay-cli"))?, "binary");
  assert_eq!(std::fs::read_to_string(publish.join("README.md"))?, "# relay\n");
  assert!(!publish.join("setup.ps1").exists());
  assert_eq!(report["skipped"], 1);
  assert_eq!(report["copied"].as_array().unwrap().len(), 2);
  Ok(())
}

#[test]
fn test_compile_info_release_then_debug() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  run_cargo_relay(&fx.frontend, &["relay", "compile-info"])?;
  let info = std::fs::read_to_string(fx.compile_info())?;
  assert!(info.contains("VERSION: &str = \"1.2.0\""));
  assert!(!info.contains("{date}"));

  run_cargo_relay(&fx.frontend, &["relay", "compile-info", "--mode", "debug"])?;
  assert!(!fx.compile_info().exists());
  Ok(())
}

#[test]
fn test_compile_info_missing_template() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  std::fs::remove_file(fx.frontend.join("templates/compile_info.rs.template"))?;

  let output = relay(&fx.frontend, &["relay", "compile-info"])?;
  assert_eq!(output.status.code(), Some(50));
  Ok(())
}

#[test]
fn test_hide_is_debounced_unless_forced() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let first = stdout_json(&run_cargo_relay(&fx.frontend, &["relay", "hide", "--json"])?)?;
  assert_eq!(first["outcome"], "applied");
  assert!(fx.frontend.join(".temp/last_visibility_check").exists());

  let second = stdout_json(&run_cargo_relay(&fx.frontend, &["relay", "hide", "--json"])?)?;
  assert_eq!(second["outcome"], "skipped");
  assert_eq!(second["reason"], "debounced");

  let forced = stdout_json(&run_cargo_relay(&fx.frontend, &["relay", "hide", "--json", "--force"])?)?;
  assert_eq!(forced["outcome"], "applied");
  Ok(())
}
