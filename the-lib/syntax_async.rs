//! Generation tracking for asynchronous language resolution.
//!
//! Resolutions can complete out of order. Every request is tagged with a
//! monotonically increasing generation, and only a completion carrying the
//! latest generation may install its binding. Older completions are dropped.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveLifecycle {
  latest:  u64,
  applied: Option<u64>,
}

impl ResolveLifecycle {
  /// Start a new request, superseding every earlier one.
  pub fn begin(&mut self) -> u64 {
    self.latest = self.latest.saturating_add(1);
    self.latest
  }

  pub fn latest(&self) -> u64 {
    self.latest
  }

  pub fn applied(&self) -> Option<u64> {
    self.applied
  }

  pub fn is_current(&self, generation: u64) -> bool {
    generation != 0 && generation == self.latest
  }

  /// Record a completion. Returns whether its result may be installed.
  pub fn complete(&mut self, generation: u64) -> bool {
    if !self.is_current(generation) {
      return false;
    }
    self.applied = Some(generation);
    true
  }

  /// Invalidate every outstanding request without starting a new one.
  pub fn cancel_pending(&mut self) {
    self.latest = self.latest.saturating_add(1);
  }
}
