use crate::commands::{load_config, print_json};
use crate::core::clock::SystemClock;
use crate::core::error::RelayResult;
use crate::core::process::SystemRunner;
use crate::pipeline::build::{BuildMode, TimestampTokens};
use crate::pipeline::orchestrator::{PipelineOrchestrator, RunOptions};
use crate::pipeline::state::{PipelineReport, PipelineState, StageStatus};
use crate::pipeline::visibility::platform_attributes;

/// Run the full release pipeline
pub fn run_pipeline(mode: BuildMode, frontend_only: bool, force_hide: bool, json: bool) -> RelayResult<()> {
  let config = load_config()?;

  // Child output streams to the terminal unless stdout is reserved for JSON
  let runner = if json {
    SystemRunner::captured()
  } else {
    SystemRunner::echoing()
  };
  let clock = SystemClock;
  let tokens = TimestampTokens::default();
  let attributes = platform_attributes();

  if !json {
    println!("🚀 Release pipeline ({} mode)\n", mode);
  }

  let orchestrator = PipelineOrchestrator::new(&config, &runner, &clock, &tokens, attributes.as_ref());
  let run = orchestrator.run(RunOptions {
    mode,
    frontend_only,
    force_visibility: force_hide,
  });

  if json {
    print_json(&run.report)?;
  } else {
    print_report(&run.report);
  }

  match run.failure {
    Some(err) => Err(err),
    None => Ok(()),
  }
}

fn print_report(report: &PipelineReport) {
  println!();
  for stage in &report.stages {
    let (icon, status) = match stage.status {
      StageStatus::Success => ("✅", "ok"),
      StageStatus::Skipped => ("⏭️ ", "skipped"),
      StageStatus::Failed => ("❌", "failed"),
      StageStatus::NotRun => ("⏸️ ", "not run"),
    };
    print!("{} {:<20} {:<8}", icon, stage.stage.label(), status);
    if stage.status != StageStatus::NotRun {
      print!(" {:>6}ms", stage.duration_ms);
    }
    match (&stage.status, &stage.detail) {
      (StageStatus::Skipped, Some(detail)) => println!("  ({})", detail),
      _ => println!(),
    }
  }

  match &report.final_state {
    PipelineState::Done { elapsed_ms } => {
      println!("\n🎉 Done in {:.1}s", *elapsed_ms as f64 / 1000.0);
      if let Some(binary) = &report.artifacts.binary {
        println!("   binary:    {}", binary.display());
      }
      if let Some(installer) = &report.artifacts.installer {
        println!("   installer: {}", installer.display());
      }
    }
    PipelineState::Aborted { stage, .. } => {
      println!("\n🛑 Aborted at {} after {:.1}s", stage, report.elapsed_ms as f64 / 1000.0);
    }
    PipelineState::Init | PipelineState::Running { .. } => {}
  }
}
