use crate::commands::{load_config, print_json};
use crate::core::error::RelayResult;
use crate::release::publish::Publisher;

/// Stage binaries and extra files into the publish directory
pub fn run_export(json: bool) -> RelayResult<()> {
  let config = load_config()?;
  let frontend = config.frontend_root();

  let report = Publisher::new(&config.publish, &frontend).run(!json)?;

  if json {
    return print_json(&report);
  }

  println!(
    "📦 Copied {} file(s) to {} in {:.2}s",
    report.copied.len(),
    report.publish_dir.display(),
    report.elapsed_ms as f64 / 1000.0
  );
  for name in &report.missing_binaries {
    println!("⚠️  binary not found: {}", name);
  }
  for source in &report.missing_sources {
    println!("⚠️  source not found: {}", source.display());
  }
  Ok(())
}
