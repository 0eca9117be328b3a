//! Installer packaging
//!
//! The packaging specification (an Inno Setup script by default) can be kept
//! as a template with `<<<VERSION>>>`, `<<<AUTHOR>>>` and `<<<SITE>>>`
//! markers; it is rendered from the frontend manifest right before the
//! packager runs.

use crate::cargo::manifest::ManifestInfo;
use crate::core::error::{RelayError, RelayResult, StageError};
use crate::core::process::{CommandSpec, ProcessRunner};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutcome {
  pub spec: PathBuf,
  /// Present when an expected installer path is configured
  pub installer: Option<PathBuf>,
}

pub struct InstallerPackager<'a> {
  runner: &'a dyn ProcessRunner,
  packager: &'a str,
  workspace: &'a Path,
  template: Option<PathBuf>,
  installer: Option<PathBuf>,
}

impl<'a> InstallerPackager<'a> {
  pub fn new(runner: &'a dyn ProcessRunner, packager: &'a str, workspace: &'a Path) -> Self {
    Self {
      runner,
      packager,
      workspace,
      template: None,
      installer: None,
    }
  }

  /// Render the spec from `template` before packaging
  pub fn with_template(mut self, template: Option<PathBuf>) -> Self {
    self.template = template;
    self
  }

  /// Require `installer` to exist after the packager exits
  pub fn expecting(mut self, installer: Option<PathBuf>) -> Self {
    self.installer = installer;
    self
  }

  /// Package `spec_path`; `required` lists artifacts that must already exist
  pub fn package(&self, spec_path: &Path, required: &[PathBuf]) -> RelayResult<PackageOutcome> {
    if let Some(missing) = required.iter().find(|p| !p.exists()) {
      return Err(failure(format!("required artifact {} does not exist", missing.display())));
    }

    if let Some(template) = &self.template {
      self.render_spec(template, spec_path)?;
    }
    if !spec_path.exists() {
      return Err(failure(format!(
        "packaging specification {} does not exist",
        spec_path.display()
      )));
    }

    let spec = CommandSpec::new(self.packager)
      .arg(spec_path.to_string_lossy())
      .current_dir(self.workspace);
    info!(command = %spec, "packaging installer");

    let output = self.runner.run(&spec).map_err(|e| failure(e.to_string()))?;
    if !output.success() {
      return Err(failure(format!("`{}` exited with code {}", spec, output.exit_code)));
    }

    if let Some(installer) = &self.installer
      && !installer.exists()
    {
      return Err(failure(format!(
        "packager succeeded but {} was not produced",
        installer.display()
      )));
    }

    Ok(PackageOutcome {
      spec: spec_path.to_path_buf(),
      installer: self.installer.clone(),
    })
  }

  fn render_spec(&self, template: &Path, spec_path: &Path) -> RelayResult<()> {
    let source = fs::read_to_string(template)
      .map_err(|e| failure(format!("cannot read template {}: {}", template.display(), e)))?;
    let manifest = ManifestInfo::load(self.workspace).map_err(|e| failure(e.to_string()))?;
    let rendered = render_markers(&source, &manifest);

    if let Some(parent) = spec_path.parent() {
      fs::create_dir_all(parent).map_err(|e| failure(format!("cannot create {}: {}", parent.display(), e)))?;
    }
    fs::write(spec_path, rendered).map_err(|e| failure(format!("cannot write {}: {}", spec_path.display(), e)))?;
    tracing::debug!(spec = %spec_path.display(), "packaging specification rendered");
    Ok(())
  }
}

fn render_markers(source: &str, manifest: &ManifestInfo) -> String {
  source
    .replace("<<<AUTHOR>>>", manifest.author())
    .replace("<<<VERSION>>>", &manifest.version)
    .replace("<<<SITE>>>", manifest.homepage.as_deref().unwrap_or(""))
}

fn failure(reason: String) -> RelayError {
  StageError::PackagingFailure { reason }.into()
}
