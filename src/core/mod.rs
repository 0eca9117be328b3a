//! Core building blocks shared by every pipeline stage
//!
//! - **clock**: injectable wall clock
//! - **config**: relay.toml parsing and validation
//! - **error**: error taxonomy with exit codes and help messages
//! - **process**: subprocess capability (`ProcessRunner`)
//! - **repository**: core/frontend repository descriptors
//! - **vcs**: git queries through the system binary

pub mod clock;
pub mod config;
pub mod error;
pub mod process;
pub mod repository;
pub mod vcs;
