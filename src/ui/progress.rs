//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars drawn on stderr

use linya::{Bar, Progress};

/// Progress bar for file copies
pub struct FileProgress {
  progress: Progress,
  bar: Bar,
}

impl FileProgress {
  /// Create a new progress bar for `total` files
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// A bar only when `enabled` and there is something to count
  pub fn maybe(enabled: bool, total: usize, label: impl Into<String>) -> Option<Self> {
    (enabled && total > 0).then(|| Self::new(total, label))
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
