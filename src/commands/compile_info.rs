use crate::commands::load_config;
use crate::core::clock::SystemClock;
use crate::core::error::RelayResult;
use crate::core::process::SystemRunner;
use crate::pipeline::build::{BuildMode, TimestampTokens, TokenSource};
use crate::pipeline::export::{ArtifactExporter, ArtifactOutcome, CompileInfoPaths};

/// Regenerate (release) or clear (debug) the compile-info artifact
pub fn run_compile_info(mode: BuildMode) -> RelayResult<()> {
  let config = load_config()?;
  let runner = SystemRunner::captured();
  let clock = SystemClock;
  let frontend = config.frontend_root();
  let paths = CompileInfoPaths {
    template: config.frontend_path(&config.compile_info.template),
    destination: config.frontend_path(&config.compile_info.destination),
  };

  let exporter = ArtifactExporter::new(&runner, &clock, &config.export.command, &frontend, paths);
  let build_id = TimestampTokens::default().next_token();

  match exporter.apply_policy(mode, build_id.as_str())? {
    ArtifactOutcome::Regenerated { path, sha256 } => {
      println!("📝 Wrote {}", path.display());
      println!("   sha256: {}", sha256);
    }
    ArtifactOutcome::Cleared { path, existed: true } => println!("🧹 Removed {}", path.display()),
    ArtifactOutcome::Cleared { path, existed: false } => println!("🧹 Nothing to remove at {}", path.display()),
  }
  Ok(())
}
