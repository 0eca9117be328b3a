//! Release artifacts produced around the build
//!
//! - **compile_info**: build metadata and template rendering for the
//!   generated compile-info source file
//! - **publish**: the built-in exporter staging binaries and extra files
//!
//! # Example relay.toml
//!
//! ```toml
//! [compile_info]
//! template = "templates/compile_info.rs.template"
//! destination = "src/data/compile_info.rs"
//!
//! [publish]
//! target_dir = "target"
//! publish_dir = ".temp/publish"
//! binaries = ["relay-cli", "relay-cli.exe"]
//!
//! [[publish.copies]]
//! from = "scripts/install.ps1"
//! to = "install.ps1"
//! platforms = ["windows"]
//! ```

pub mod compile_info;
pub mod publish;
