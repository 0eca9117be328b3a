//! Release pipeline stages and their orchestration
//!
//! Leaf components first; [`orchestrator`] sequences them:
//!
//! - **tooling**: required external programs are installed
//! - **visibility**: hidden attribute on dotfiles and ignored paths
//! - **worktree**: clean-worktree guard
//! - **test_runner**: core then frontend test suites
//! - **build**: workspace build with a force-build token
//! - **export**: exporter tool plus compile-info policy
//! - **package**: installer compiler
//! - **state**: state machine and run report

pub mod build;
pub mod export;
pub mod orchestrator;
pub mod package;
pub mod state;
pub mod test_runner;
pub mod tooling;
pub mod visibility;
pub mod worktree;
