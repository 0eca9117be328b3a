//! CLI commands for cargo-relay
//!
//! - **run**: the full release pipeline
//! - **check**: clean-worktree guard only
//! - **hide**: visibility scan only
//! - **compile_info**: regenerate or clear the compile-info artifact
//! - **export**: built-in exporter (publish directory)
//! - **status**: branch, HEAD and cleanliness of both repositories

pub mod check;
pub mod compile_info;
pub mod export;
pub mod hide;
pub mod run;
pub mod status;

pub use check::run_check;
pub use compile_info::run_compile_info;
pub use export::run_export;
pub use hide::run_hide;
pub use run::run_pipeline;
pub use status::run_status;

use crate::core::config::RelayConfig;
use crate::core::error::RelayResult;
use serde::Serialize;

/// Load relay.toml from the current directory
fn load_config() -> RelayResult<RelayConfig> {
  let current_dir = std::env::current_dir()?;
  RelayConfig::load(&current_dir)
}

fn print_json<T: Serialize>(value: &T) -> RelayResult<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
