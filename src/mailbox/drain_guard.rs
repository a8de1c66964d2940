use tracing::error;

use crate::mailbox::scheduler::{schedule, DrainTarget};
use std::sync::Arc;

/// Restores a mailbox's scheduling invariants when a drain burst unwinds.
///
/// Armed around every burst. If a handler panics the guard is dropped without
/// being waived: it clears `RUNNING` and re-arms the mailbox when messages remain,
/// then lets the panic continue to the dispatcher's task boundary.
pub(crate) struct DrainGuard<'a, T: DrainTarget> {
  target: &'a Arc<T>,
  completed: bool,
}

impl<'a, T: DrainTarget> DrainGuard<'a, T> {
  pub fn new(target: &'a Arc<T>) -> Self {
    Self {
      target,
      completed: false,
    }
  }

  /// Marks the burst as having returned normally.
  pub fn waive(mut self) {
    self.completed = true;
  }
}

impl<T: DrainTarget> Drop for DrainGuard<'_, T> {
  fn drop(&mut self) {
    if self.completed {
      return;
    }
    error!("Mailbox handler panicked during drain; releasing mailbox and propagating the fault");

    let state = self.target.scheduler();
    state.release();
    // The faulting message is gone; anything still queued needs a new drain.
    if state.take_pending() || self.target.has_messages() {
      schedule(self.target);
    }
  }
}
