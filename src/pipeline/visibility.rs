//! Hidden-attribute housekeeping for dotfiles and ignored paths
//!
//! Keeps the frontend tree tidy in file explorers that ignore the leading-dot
//! convention: everything named `.something` and everything git ignores gets
//! the platform "hidden" attribute, everything else loses it. A full scan is
//! expensive on large trees, so scans are debounced through a marker file
//! holding the time of the last completed scan.

use crate::core::clock::Clock;
use crate::core::config::VisibilityConfig;
use crate::core::error::{RelayResult, ResultExt};
use crate::core::process::ProcessRunner;
use crate::core::vcs::SystemGit;
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Platform hidden-attribute backend
///
/// `Sync` because the hiding pass fans out over rayon.
pub trait HiddenAttribute: Sync {
  fn is_hidden(&self, path: &Path) -> io::Result<bool>;
  fn set_hidden(&self, path: &Path, hidden: bool) -> io::Result<()>;
}

/// `attrib +h` / `attrib -h`
#[cfg(windows)]
pub struct WindowsAttributes;

#[cfg(windows)]
impl HiddenAttribute for WindowsAttributes {
  fn is_hidden(&self, path: &Path) -> io::Result<bool> {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    Ok(fs::symlink_metadata(path)?.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
  }

  fn set_hidden(&self, path: &Path, hidden: bool) -> io::Result<()> {
    let flag = if hidden { "+h" } else { "-h" };
    run_attribute_tool("attrib", &[flag], path)
  }
}

/// `chflags hidden` / `chflags nohidden`
#[cfg(target_os = "macos")]
pub struct MacAttributes;

#[cfg(target_os = "macos")]
impl HiddenAttribute for MacAttributes {
  fn is_hidden(&self, path: &Path) -> io::Result<bool> {
    use std::os::macos::fs::MetadataExt;
    const UF_HIDDEN: u32 = 0x0000_8000;
    Ok(fs::symlink_metadata(path)?.st_flags() & UF_HIDDEN != 0)
  }

  fn set_hidden(&self, path: &Path, hidden: bool) -> io::Result<()> {
    let flag = if hidden { "hidden" } else { "nohidden" };
    run_attribute_tool("chflags", &["-h", flag], path)
  }
}

#[cfg(any(windows, target_os = "macos"))]
fn run_attribute_tool(program: &str, args: &[&str], path: &Path) -> io::Result<()> {
  let status = std::process::Command::new(program)
    .args(args)
    .arg(path)
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .status()?;
  if status.success() {
    Ok(())
  } else {
    Err(io::Error::other(format!("{} exited with {}", program, status)))
  }
}

/// Platforms where a leading dot is the only notion of "hidden"
pub struct NoopAttributes;

impl HiddenAttribute for NoopAttributes {
  fn is_hidden(&self, _path: &Path) -> io::Result<bool> {
    Ok(false)
  }

  fn set_hidden(&self, _path: &Path, _hidden: bool) -> io::Result<()> {
    Ok(())
  }
}

/// Backend for the host platform
pub fn platform_attributes() -> Box<dyn HiddenAttribute> {
  #[cfg(windows)]
  {
    Box::new(WindowsAttributes)
  }
  #[cfg(target_os = "macos")]
  {
    Box::new(MacAttributes)
  }
  #[cfg(not(any(windows, target_os = "macos")))]
  {
    Box::new(NoopAttributes)
  }
}

/// Counts from one completed scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibilitySummary {
  pub scanned: usize,
  pub unhidden: usize,
  pub hidden: usize,
  pub failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "lowercase")]
pub enum SkipReason {
  /// Last scan is younger than the debounce window
  Debounced { last_check: DateTime<Utc> },
  /// `[visibility] enabled = false`
  Disabled,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::Debounced { last_check } => write!(f, "debounced (last check {})", last_check.to_rfc3339()),
      SkipReason::Disabled => write!(f, "disabled"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum VisibilityOutcome {
  Applied(VisibilitySummary),
  Skipped(SkipReason),
}

pub struct VisibilityManager<'a> {
  config: &'a VisibilityConfig,
  runner: &'a dyn ProcessRunner,
  attributes: &'a dyn HiddenAttribute,
  clock: &'a dyn Clock,
}

impl<'a> VisibilityManager<'a> {
  pub fn new(
    config: &'a VisibilityConfig,
    runner: &'a dyn ProcessRunner,
    attributes: &'a dyn HiddenAttribute,
    clock: &'a dyn Clock,
  ) -> Self {
    Self {
      config,
      runner,
      attributes,
      clock,
    }
  }

  /// Scan `root` unless disabled or debounced; `force` ignores the window
  pub fn apply(&self, root: &Path, force: bool) -> RelayResult<VisibilityOutcome> {
    if !self.config.enabled {
      return Ok(VisibilityOutcome::Skipped(SkipReason::Disabled));
    }

    let marker = root.join(&self.config.marker);
    let now = self.clock.now();

    if !force
      && self.config.debounce_secs > 0
      && let Some(last_check) = read_marker(&marker)
    {
      let elapsed = now.signed_duration_since(last_check);
      let window = Duration::seconds(i64::try_from(self.config.debounce_secs).unwrap_or(i64::MAX));
      if elapsed >= Duration::zero() && elapsed < window {
        tracing::debug!(marker = %marker.display(), "visibility scan debounced");
        return Ok(VisibilityOutcome::Skipped(SkipReason::Debounced { last_check }));
      }
    }

    let summary = self.scan(root);

    if let Some(parent) = marker.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&marker, now.to_rfc3339()).with_context(|| format!("Failed to write {}", marker.display()))?;

    tracing::info!(
      scanned = summary.scanned,
      hidden = summary.hidden,
      unhidden = summary.unhidden,
      failures = summary.failures,
      "visibility scan complete"
    );
    Ok(VisibilityOutcome::Applied(summary))
  }

  fn scan(&self, root: &Path) -> VisibilitySummary {
    let mut summary = VisibilitySummary::default();
    let mut entries = Vec::new();

    let walker = WalkDir::new(root)
      .min_depth(1)
      .into_iter()
      .filter_entry(|e| !self.is_excluded(e.file_name().to_string_lossy().as_ref()));
    for entry in walker {
      match entry {
        Ok(entry) => entries.push(entry.into_path()),
        Err(e) => {
          tracing::warn!(error = %e, "skipping unreadable entry");
          summary.failures += 1;
        }
      }
    }
    summary.scanned = entries.len();

    // Pass 1: start from a fully visible tree
    for path in &entries {
      match self.attributes.is_hidden(path) {
        Ok(false) => {}
        Ok(true) => match self.attributes.set_hidden(path, false) {
          Ok(()) => summary.unhidden += 1,
          Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to unhide");
            summary.failures += 1;
          }
        },
        Err(e) => {
          tracing::warn!(path = %path.display(), error = %e, "failed to read attributes");
          summary.failures += 1;
        }
      }
    }

    // Pass 2: hide dotfiles and ignored paths
    let mut targets: BTreeSet<PathBuf> = entries
      .iter()
      .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.')))
      .cloned()
      .collect();
    targets.extend(self.ignored(root));

    let attributes = self.attributes;
    let failures: usize = targets
      .par_iter()
      .map(|path| match attributes.set_hidden(path, true) {
        Ok(()) => 0,
        Err(e) => {
          tracing::warn!(path = %path.display(), error = %e, "failed to hide");
          1
        }
      })
      .sum();
    summary.hidden = targets.len() - failures;
    summary.failures += failures;

    summary
  }

  /// Git-ignored paths under `root`, minus anything inside an excluded entry
  fn ignored(&self, root: &Path) -> Vec<PathBuf> {
    let git = SystemGit::new(root, self.runner);
    let ignored = match git.ignored_paths() {
      Ok(paths) => paths,
      Err(e) => {
        tracing::warn!(root = %root.display(), error = %e, "could not list ignored paths; hiding dotfiles only");
        return Vec::new();
      }
    };

    ignored
      .into_iter()
      .filter(|rel| {
        !rel.components().any(|c| match c {
          Component::Normal(name) => self.is_excluded(name.to_string_lossy().as_ref()),
          _ => false,
        })
      })
      .map(|rel| root.join(rel))
      .filter(|p| p.exists())
      .collect()
  }

  fn is_excluded(&self, name: &str) -> bool {
    self.config.exclude.iter().any(|e| e == name)
  }
}

/// Last scan time, `None` when the marker is absent or unreadable
fn read_marker(marker: &Path) -> Option<DateTime<Utc>> {
  let content = fs::read_to_string(marker).ok()?;
  DateTime::parse_from_rfc3339(content.trim())
    .ok()
    .map(|t| t.with_timezone(&Utc))
}
