//! Built-in exporter: stage release binaries and extra files
//!
//! Layout of the publish directory after a run:
//!
//! ```text
//! <publish_dir>/
//!   bin/<binary>          one per name in [publish] binaries
//!   <copies[].to>         extra files for the installer
//! ```
//!
//! The publish directory is recreated from scratch on every run.

use crate::core::config::{CopyConfig, PublishConfig};
use crate::core::error::{RelayError, RelayResult, ResultExt};
use crate::ui::progress::FileProgress;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
  pub publish_dir: PathBuf,
  pub copied: Vec<PathBuf>,
  /// Configured binaries not found under the target directory
  pub missing_binaries: Vec<String>,
  /// Copy sources that did not exist
  pub missing_sources: Vec<PathBuf>,
  /// Copies skipped for a platform mismatch
  pub skipped: usize,
  pub elapsed_ms: u128,
}

pub struct Publisher<'a> {
  config: &'a PublishConfig,
  root: &'a Path,
  os: &'a str,
}

impl<'a> Publisher<'a> {
  /// Stage from `root` (the frontend repository) for the host OS
  pub fn new(config: &'a PublishConfig, root: &'a Path) -> Self {
    Self {
      config,
      root,
      os: std::env::consts::OS,
    }
  }

  /// Override the OS copies are filtered against
  #[cfg(test)]
  pub fn for_os(mut self, os: &'a str) -> Self {
    self.os = os;
    self
  }

  pub fn run(&self, show_progress: bool) -> RelayResult<PublishReport> {
    let started = Instant::now();
    let publish_dir = self.root.join(&self.config.publish_dir);
    let target_dir = self.root.join(&self.config.target_dir);
    self.check_publish_dir(&publish_dir)?;

    if publish_dir.exists() {
      fs::remove_dir_all(&publish_dir).with_context(|| format!("Failed to clear {}", publish_dir.display()))?;
    }
    let bin_dir = publish_dir.join("bin");
    fs::create_dir_all(&bin_dir).with_context(|| format!("Failed to create {}", bin_dir.display()))?;

    let mut report = PublishReport {
      publish_dir: publish_dir.clone(),
      ..Default::default()
    };

    let binaries = self.locate_binaries(&target_dir)?;
    report.missing_binaries = self
      .config
      .binaries
      .iter()
      .filter(|name| !binaries.contains_key(name.as_str()))
      .cloned()
      .collect();
    for name in &report.missing_binaries {
      tracing::warn!(binary = %name, target_dir = %target_dir.display(), "binary not found");
    }

    let copies: Vec<&CopyConfig> = self
      .config
      .copies
      .iter()
      .filter(|c| {
        let applies = c.applies_to(self.os);
        if !applies {
          tracing::debug!(from = %c.from.display(), os = self.os, "copy skipped for platform");
        }
        applies
      })
      .collect();
    report.skipped = self.config.copies.len() - copies.len();

    let mut progress = FileProgress::maybe(show_progress, binaries.len() + copies.len(), "Publishing");

    for (name, source) in &binaries {
      let dest = bin_dir.join(name);
      copy_file(source, &dest)?;
      report.copied.push(dest);
      if let Some(p) = progress.as_mut() {
        p.inc();
      }
    }

    for copy in copies {
      let source = self.root.join(&copy.from);
      if source.exists() {
        let dest = if copy.to.as_os_str().is_empty() {
          publish_dir.join(copy.from.file_name().unwrap_or(copy.from.as_os_str()))
        } else {
          publish_dir.join(&copy.to)
        };
        report.copied.extend(copy_tree(&source, &dest)?);
      } else {
        tracing::warn!(source = %source.display(), "copy source does not exist");
        report.missing_sources.push(source);
      }
      if let Some(p) = progress.as_mut() {
        p.inc();
      }
    }

    report.elapsed_ms = started.elapsed().as_millis();
    tracing::info!(
      copied = report.copied.len(),
      elapsed_ms = report.elapsed_ms as u64,
      "publish directory ready"
    );
    Ok(report)
  }

  /// Refuse publish directories that would wipe the repository or the build output
  fn check_publish_dir(&self, publish_dir: &Path) -> RelayResult<()> {
    let target_dir = self.root.join(&self.config.target_dir);
    let dangerous = self.root.starts_with(publish_dir) || target_dir.starts_with(publish_dir);
    if dangerous || self.config.publish_dir.as_os_str().is_empty() {
      return Err(RelayError::with_help(
        format!("Refusing to recreate publish directory {}", publish_dir.display()),
        "Point [publish] publish_dir at a dedicated directory such as .temp/publish.",
      ));
    }
    Ok(())
  }

  /// Newest file under `target_dir` for each configured binary name
  fn locate_binaries(&self, target_dir: &Path) -> RelayResult<BTreeMap<String, PathBuf>> {
    let mut found: BTreeMap<String, (SystemTime, PathBuf)> = BTreeMap::new();
    if self.config.binaries.is_empty() || !target_dir.exists() {
      return Ok(BTreeMap::new());
    }

    for entry in WalkDir::new(target_dir) {
      let entry = entry?;
      if !entry.file_type().is_file() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().into_owned();
      if !self.config.binaries.contains(&name) {
        continue;
      }
      let modified = entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .unwrap_or(SystemTime::UNIX_EPOCH);
      let newer = found.get(&name).is_none_or(|(seen, _)| modified > *seen);
      if newer {
        found.insert(name, (modified, entry.into_path()));
      }
    }

    Ok(found.into_iter().map(|(name, (_, path))| (name, path)).collect())
  }
}

fn copy_file(source: &Path, dest: &Path) -> RelayResult<()> {
  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  fs::copy(source, dest)
    .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
  Ok(())
}

/// Copy a file, or a directory recursively; returns the files written
fn copy_tree(source: &Path, dest: &Path) -> RelayResult<Vec<PathBuf>> {
  if source.is_file() {
    copy_file(source, dest)?;
    return Ok(vec![dest.to_path_buf()]);
  }

  let mut written = Vec::new();
  for entry in WalkDir::new(source) {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let rel = entry
      .path()
      .strip_prefix(source)
      .map_err(|e| RelayError::message(format!("Unexpected path {}: {}", entry.path().display(), e)))?;
    let target = dest.join(rel);
    copy_file(entry.path(), &target)?;
    written.push(target);
  }
  Ok(written)
}
