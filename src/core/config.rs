//! relay.toml parsing and validation
//!
//! Searched in order: relay.toml, .relay.toml, .cargo/relay.toml, .config/relay.toml
//!
//! ```toml
//! [repositories]
//! frontend = "."
//! core = "../core"
//!
//! [guard]
//! scope = "both"          # or "frontend"
//!
//! [package]
//! packager = "iscc"
//! spec = "scripts/setup/windows/setup.iss"
//! ```
//!
//! `[repositories]` paths are relative to the directory holding the config
//! file; every other path is relative to the frontend repository.

use crate::core::error::{ConfigError, RelayError, RelayResult, ResultExt};
use crate::core::repository::Repository;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Configuration for cargo-relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
  pub repositories: RepositoriesConfig,
  #[serde(default)]
  pub guard: GuardConfig,
  #[serde(default)]
  pub tooling: ToolingConfig,
  #[serde(default)]
  pub visibility: VisibilityConfig,
  #[serde(default)]
  pub test: TestConfig,
  #[serde(default)]
  pub build: BuildConfig,
  #[serde(default)]
  pub export: ExportConfig,
  #[serde(default)]
  pub compile_info: CompileInfoConfig,
  #[serde(default)]
  pub package: PackageConfig,
  #[serde(default)]
  pub publish: PublishConfig,

  /// Directory the config was loaded from
  #[serde(skip)]
  pub config_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoriesConfig {
  /// Frontend repository (default: the config file's directory)
  #[serde(default = "default_frontend")]
  pub frontend: PathBuf,
  /// Core library repository
  pub core: Option<PathBuf>,
}

fn default_frontend() -> PathBuf {
  PathBuf::from(".")
}

/// Which repositories must be clean before a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuardScope {
  /// Frontend and core library
  #[default]
  Both,
  /// Frontend only
  Frontend,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuardConfig {
  #[serde(default)]
  pub scope: GuardScope,
}

/// Tools that must exist before anything expensive runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolingConfig {
  /// Checked in addition to the packager and the test, build and export
  /// programs (default: ["git"])
  #[serde(default = "default_required_tools")]
  pub required: Vec<String>,
}

fn default_required_tools() -> Vec<String> {
  vec!["git".to_string()]
}

impl Default for ToolingConfig {
  fn default() -> Self {
    Self {
      required: default_required_tools(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,

  /// Minimum seconds between two full scans (0 disables debouncing)
  #[serde(default = "default_debounce_secs")]
  pub debounce_secs: u64,

  /// Timestamp file recording the last scan
  #[serde(default = "default_marker")]
  pub marker: PathBuf,

  /// Entry names that always stay visible and are never descended
  #[serde(default = "default_always_visible")]
  pub exclude: Vec<String>,
}

fn default_true() -> bool {
  true
}

fn default_debounce_secs() -> u64 {
  600
}

fn default_marker() -> PathBuf {
  PathBuf::from(".temp/last_visibility_check")
}

fn default_always_visible() -> Vec<String> {
  vec![".git".to_string(), "target".to_string(), ".temp".to_string()]
}

impl Default for VisibilityConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      debounce_secs: default_debounce_secs(),
      marker: default_marker(),
      exclude: default_always_visible(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
  #[serde(default = "default_test_command")]
  pub command: Vec<String>,
}

fn default_test_command() -> Vec<String> {
  vec!["cargo".into(), "test".into(), "--workspace".into()]
}

impl Default for TestConfig {
  fn default() -> Self {
    Self {
      command: default_test_command(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Build command; `--release` is appended in release mode
  #[serde(default = "default_build_command")]
  pub command: Vec<String>,

  /// Environment variable carrying the force-build token
  #[serde(default = "default_token_env")]
  pub token_env: String,

  /// Binary name (default: frontend `[package] name`)
  #[serde(default)]
  pub binary: Option<String>,

  /// Target directory (default: from `cargo metadata`)
  #[serde(default)]
  pub target_dir: Option<PathBuf>,
}

fn default_build_command() -> Vec<String> {
  vec!["cargo".into(), "build".into(), "--workspace".into()]
}

fn default_token_env() -> String {
  "FORCE_BUILD".to_string()
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      command: default_build_command(),
      token_env: default_token_env(),
      binary: None,
      target_dir: None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
  /// Exporter command, run in the frontend repository
  #[serde(default = "default_export_command")]
  pub command: Vec<String>,
}

fn default_export_command() -> Vec<String> {
  vec!["cargo".into(), "relay".into(), "export".into()]
}

impl Default for ExportConfig {
  fn default() -> Self {
    Self {
      command: default_export_command(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileInfoConfig {
  #[serde(default = "default_compile_info_template")]
  pub template: PathBuf,
  #[serde(default = "default_compile_info")]
  pub destination: PathBuf,
}

fn default_compile_info_template() -> PathBuf {
  PathBuf::from("templates/compile_info.rs.template")
}

fn default_compile_info() -> PathBuf {
  PathBuf::from("src/data/compile_info.rs")
}

impl Default for CompileInfoConfig {
  fn default() -> Self {
    Self {
      template: default_compile_info_template(),
      destination: default_compile_info(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Installer compiler program
  #[serde(default = "default_packager")]
  pub packager: String,

  /// Packaging specification handed to the packager
  #[serde(default = "default_package_spec")]
  pub spec: PathBuf,

  /// Optional template the spec is rendered from before packaging
  #[serde(default)]
  pub template: Option<PathBuf>,

  /// Installer the packager is expected to produce
  #[serde(default)]
  pub installer: Option<PathBuf>,
}

fn default_packager() -> String {
  "iscc".to_string()
}

fn default_package_spec() -> PathBuf {
  PathBuf::from("scripts/setup/windows/setup.iss")
}

impl Default for PackageConfig {
  fn default() -> Self {
    Self {
      packager: default_packager(),
      spec: default_package_spec(),
      template: None,
      installer: None,
    }
  }
}

/// Built-in exporter: which binaries and extra files land in the publish dir
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  #[serde(default = "default_publish_target_dir")]
  pub target_dir: PathBuf,
  #[serde(default = "default_publish_dir")]
  pub publish_dir: PathBuf,
  #[serde(default)]
  pub binaries: Vec<String>,
  #[serde(default)]
  pub copies: Vec<CopyConfig>,
}

fn default_publish_target_dir() -> PathBuf {
  PathBuf::from("target")
}

fn default_publish_dir() -> PathBuf {
  PathBuf::from(".temp/publish")
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      target_dir: default_publish_target_dir(),
      publish_dir: default_publish_dir(),
      binaries: Vec::new(),
      copies: Vec::new(),
    }
  }
}

/// An extra file copied into the publish directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
  pub from: PathBuf,
  #[serde(default)]
  pub to: PathBuf,
  /// Limit to these `std::env::consts::OS` values (empty = all)
  #[serde(default)]
  pub platforms: Vec<String>,
}

impl CopyConfig {
  pub fn applies_to(&self, os: &str) -> bool {
    self.platforms.is_empty() || self.platforms.iter().any(|p| p == os)
  }
}

impl RelayConfig {
  /// Find config file in search order: relay.toml, .relay.toml, .cargo/relay.toml, .config/relay.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("relay.toml"),
      path.join(".relay.toml"),
      path.join(".cargo").join("relay.toml"),
      path.join(".config").join("relay.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config (searches multiple locations)
  pub fn load(path: &Path) -> RelayResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      RelayError::Config(ConfigError::NotFound {
        search_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let mut config = Self::parse(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    // .cargo/relay.toml and .config/relay.toml still describe `path`
    config.config_dir = path.to_path_buf();
    config.validate()?;

    Ok(config)
  }

  /// Parse without touching the filesystem
  pub fn parse(content: &str) -> RelayResult<Self> {
    let config: RelayConfig = toml_edit::de::from_str(content)?;
    Ok(config)
  }

  pub fn validate(&self) -> RelayResult<()> {
    if self.repositories.core.is_none() {
      return Err(RelayError::Config(ConfigError::MissingField {
        field: "repositories.core".to_string(),
      }));
    }

    let commands = [
      ("test.command", &self.test.command),
      ("build.command", &self.build.command),
      ("export.command", &self.export.command),
    ];
    for (field, command) in commands {
      if command.is_empty() {
        return Err(RelayError::Config(ConfigError::Invalid {
          field: field.to_string(),
          reason: "command must not be empty".to_string(),
        }));
      }
    }

    if self.build.token_env.is_empty() || self.build.token_env.contains('=') {
      return Err(RelayError::Config(ConfigError::Invalid {
        field: "build.token_env".to_string(),
        reason: format!("'{}' is not a valid environment variable name", self.build.token_env),
      }));
    }

    if self.package.packager.is_empty() {
      return Err(RelayError::Config(ConfigError::Invalid {
        field: "package.packager".to_string(),
        reason: "packager must not be empty".to_string(),
      }));
    }

    Ok(())
  }

  pub fn frontend_root(&self) -> PathBuf {
    join_clean(&self.config_dir, &self.repositories.frontend)
  }

  pub fn core_root(&self) -> PathBuf {
    match &self.repositories.core {
      Some(core) => join_clean(&self.config_dir, core),
      None => self.config_dir.clone(),
    }
  }

  pub fn frontend(&self) -> Repository {
    Repository::frontend(self.frontend_root())
  }

  pub fn core(&self) -> Repository {
    Repository::core(self.core_root())
  }

  /// Files the pipeline itself writes into the frontend worktree
  pub fn owned_paths(&self) -> Vec<PathBuf> {
    vec![self.frontend_path(&self.visibility.marker)]
  }

  /// Resolve a frontend-relative path
  pub fn frontend_path(&self, rel: &Path) -> PathBuf {
    join_clean(&self.frontend_root(), rel)
  }
}

/// `base.join(rel)` without `.` segments, so reported paths read as written
/// by hand. `..` is kept; symlinks make it unsafe to fold lexically.
pub fn join_clean(base: &Path, rel: &Path) -> PathBuf {
  base
    .join(rel)
    .components()
    .filter(|c| !matches!(c, Component::CurDir))
    .collect()
}
