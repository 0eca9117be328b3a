//! Cargo workspace integration
//!
//! - **metadata**: target directory and binary discovery via cargo_metadata
//! - **manifest**: version, authors and homepage read from Cargo.toml

pub mod manifest;
pub mod metadata;
