//! Wall-clock access, injectable so debounce windows and build timestamps can
//! be pinned in tests

use chrono::{DateTime, Utc};

pub trait Clock {
  fn now(&self) -> DateTime<Utc>;
}

/// The real system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock frozen at a fixed instant
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedClock(pub std::cell::Cell<DateTime<Utc>>);

#[cfg(test)]
impl FixedClock {
  pub fn at(instant: DateTime<Utc>) -> Self {
    Self(std::cell::Cell::new(instant))
  }

  pub fn advance(&self, by: chrono::Duration) {
    self.0.set(self.0.get() + by);
  }
}

#[cfg(test)]
impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0.get()
  }
}
