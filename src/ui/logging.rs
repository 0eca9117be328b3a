//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the command-line verbosity. Log lines go to stderr so
//! `--json` output on stdout stays machine-readable.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber; later calls are ignored
pub fn init(verbose: bool, json: bool) {
  let level = if verbose { Level::DEBUG } else { Level::WARN };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

  if json {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
      .try_init()
      .ok();
  } else {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
      .try_init()
      .ok();
  }
}
