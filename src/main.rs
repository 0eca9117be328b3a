mod cargo;
mod commands;
mod core;
mod pipeline;
mod release;
#[cfg(test)]
mod testing;
mod ui;

use clap::{Parser, Subcommand};
use crate::core::error::{RelayError, print_error};
use crate::pipeline::build::BuildMode;

/// Fail-fast release pipeline: guard, test, build, export, package
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Relay(RelayCli),
}

#[derive(Parser)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct RelayCli {
  /// Show debug logging (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Emit log lines as JSON on stderr
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Pipeline
  // ============================================================================
  /// Run the full release pipeline
  Run {
    /// Build profile; debug clears compile-info instead of regenerating it
    #[arg(long, value_enum, default_value_t = BuildMode::Release)]
    mode: BuildMode,
    /// Only require the frontend worktree to be clean
    #[arg(long)]
    frontend_only: bool,
    /// Ignore the visibility debounce window
    #[arg(long)]
    force_hide: bool,
    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Individual stages
  // ============================================================================
  /// Fail if the configured repositories have uncommitted changes
  Check {
    /// Only check the frontend repository
    #[arg(long)]
    frontend_only: bool,
  },

  /// Hide dotfiles and git-ignored paths in the frontend repository
  Hide {
    /// Scan even if the last scan is within the debounce window
    #[arg(long)]
    force: bool,
    /// Output the outcome in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Regenerate (release) or clear (debug) the compile-info artifact
  CompileInfo {
    #[arg(long, value_enum, default_value_t = BuildMode::Release)]
    mode: BuildMode,
  },

  /// Copy release binaries and extra files into the publish directory
  Export {
    /// Output the copy report in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Inspection
  // ============================================================================
  /// Show branch, HEAD and cleanliness of both repositories
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let CargoCli::Relay(cli) = CargoCli::parse();
  ui::logging::init(cli.verbose, cli.log_json);

  let result = match cli.command {
    Commands::Run {
      mode,
      frontend_only,
      force_hide,
      json,
    } => commands::run_pipeline(mode, frontend_only, force_hide, json),
    Commands::Check { frontend_only } => commands::run_check(frontend_only),
    Commands::Hide { force, json } => commands::run_hide(force, json),
    Commands::CompileInfo { mode } => commands::run_compile_info(mode),
    Commands::Export { json } => commands::run_export(json),
    Commands::Status { json } => commands::run_status(json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RelayError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
