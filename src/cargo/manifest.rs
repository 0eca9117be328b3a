//! Frontend manifest fields stamped into release artifacts
//!
//! Read with `toml_edit` rather than `cargo metadata` so that stamping works
//! without resolving the dependency graph. `[package]` wins over
//! `[workspace.package]` unless the field is inherited (`field.workspace = true`).

use crate::core::error::{RelayError, RelayResult, ResultExt};
use std::fs;
use std::path::Path;
use toml_edit::{DocumentMut, Item};

/// Version used when the manifest declares none (cargo's own default)
const DEFAULT_VERSION: &str = "0.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
  pub name: Option<String>,
  pub version: String,
  pub authors: Vec<String>,
  pub homepage: Option<String>,
}

impl ManifestInfo {
  pub fn load(workspace_root: &Path) -> RelayResult<Self> {
    let path = workspace_root.join("Cargo.toml");
    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::parse(&content).with_context(|| format!("Invalid manifest {}", path.display()))
  }

  pub fn parse(content: &str) -> RelayResult<Self> {
    let doc: DocumentMut = content.parse()?;

    let name = doc
      .get("package")
      .and_then(|p| p.get("name"))
      .and_then(|n| n.as_str())
      .map(str::to_string);

    let version = match field(&doc, "version").and_then(|v| v.as_str()) {
      Some(v) => {
        semver::Version::parse(v)
          .map_err(|e| RelayError::message(format!("Version '{}' is not valid semver: {}", v, e)))?;
        v.to_string()
      }
      None => {
        tracing::debug!("manifest declares no version, using {}", DEFAULT_VERSION);
        DEFAULT_VERSION.to_string()
      }
    };

    let authors = field(&doc, "authors")
      .and_then(|a| a.as_array())
      .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
      .unwrap_or_default();

    let homepage = field(&doc, "homepage")
      .or_else(|| field(&doc, "repository"))
      .and_then(|h| h.as_str())
      .map(str::to_string);

    Ok(Self {
      name,
      version,
      authors,
      homepage,
    })
  }

  /// First listed author, `"unknown"` when none
  pub fn author(&self) -> &str {
    self.authors.first().map(String::as_str).unwrap_or("unknown")
  }
}

/// Look up `key` in `[package]`, following `key.workspace = true` to `[workspace.package]`
fn field<'d>(doc: &'d DocumentMut, key: &str) -> Option<&'d toml_edit::Value> {
  let inherited = || {
    doc
      .get("workspace")
      .and_then(|w| w.get("package"))
      .and_then(|p| p.get(key))
      .and_then(Item::as_value)
  };

  match doc.get("package").and_then(|p| p.get(key)) {
    Some(item) if is_inherited(item) => inherited(),
    Some(item) => item.as_value().or_else(inherited),
    None => inherited(),
  }
}

fn is_inherited(item: &Item) -> bool {
  item
    .get("workspace")
    .and_then(|w| w.as_bool())
    .unwrap_or(false)
}
