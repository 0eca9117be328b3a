use crate::core::error::RelayResult;
use cargo_metadata::{MetadataCommand, TargetKind};
use std::path::{Path, PathBuf};

/// Workspace introspection using cargo_metadata
#[derive(Clone)]
pub struct WorkspaceMetadata {
  metadata: cargo_metadata::Metadata,
}

impl WorkspaceMetadata {
  pub fn load(workspace_root: &Path) -> RelayResult<Self> {
    let metadata = MetadataCommand::new()
      .manifest_path(workspace_root.join("Cargo.toml"))
      .no_deps()
      .exec()?;
    Ok(Self { metadata })
  }

  /// Where cargo puts build output (honours `CARGO_TARGET_DIR` and `build.target-dir`)
  pub fn target_directory(&self) -> PathBuf {
    self.metadata.target_directory.clone().into_std_path_buf()
  }

  /// First binary target declared by a workspace member
  pub fn first_binary(&self) -> Option<String> {
    self
      .metadata
      .workspace_packages()
      .into_iter()
      .flat_map(|pkg| pkg.targets.iter())
      .find(|target| target.kind.contains(&TargetKind::Bin))
      .map(|target| target.name.clone())
  }
}
