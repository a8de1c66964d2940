// src/mailbox/scheduler.rs

//! The drain scheduling state machine shared by every mailbox variant.
//!
//! A mailbox is drained by short-lived bursts submitted to a [`Dispatcher`].
//! Two atomics coordinate producers and the active burst:
//!
//! - the **status word** (`StatusFlags`): `RUNNING` is held by at most one drain
//!   at a time, `SUSPENDED` withholds new drains until `resume`.
//! - the **pending flag**: raised by every post, cleared when a burst starts and
//!   swapped out when a drain goes idle. A post that lands after the last empty
//!   check but before `RUNNING` is cleared is caught by that swap and re-arms
//!   the mailbox, so no message is left behind.

use crate::mailbox::drain_guard::DrainGuard;
use crate::mailbox::observer::{MailboxEvent, MailboxObserver};
use crate::runtime::Dispatcher;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use tracing::trace;

bitflags! {
  /// Bits of a mailbox's status word.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub(crate) struct StatusFlags: u8 {
    /// A drain burst owns the mailbox.
    const RUNNING = 0b01;
    /// Drains are withheld until resumed.
    const SUSPENDED = 0b10;
  }
}

/// Public view of whether a drain currently owns the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailboxStatus {
  Idle,
  Running,
}

#[derive(Debug, Default)]
pub(crate) struct SchedulerState {
  status: AtomicU8,
  has_more_messages: AtomicBool,
}

impl SchedulerState {
  /// Idle, not suspended, no pending work.
  pub fn new() -> Self {
    Self::default()
  }

  fn flags(&self) -> StatusFlags {
    StatusFlags::from_bits_truncate(self.status.load(Ordering::SeqCst))
  }

  pub fn status(&self) -> MailboxStatus {
    if self.flags().contains(StatusFlags::RUNNING) {
      MailboxStatus::Running
    } else {
      MailboxStatus::Idle
    }
  }

  pub fn is_suspended(&self) -> bool {
    self.flags().contains(StatusFlags::SUSPENDED)
  }

  pub fn mark_pending(&self) {
    self.has_more_messages.store(true, Ordering::SeqCst);
  }

  pub fn clear_pending(&self) {
    self.has_more_messages.store(false, Ordering::SeqCst);
  }

  /// Reads and clears the pending flag in one step.
  pub fn take_pending(&self) -> bool {
    self.has_more_messages.swap(false, Ordering::SeqCst)
  }

  /// The sole admission gate for a new drain: idle and not suspended -> running.
  pub fn try_acquire(&self) -> bool {
    self
      .status
      .compare_exchange(
        StatusFlags::empty().bits(),
        StatusFlags::RUNNING.bits(),
        Ordering::SeqCst,
        Ordering::SeqCst,
      )
      .is_ok()
  }

  /// Clears `RUNNING`, leaving `SUSPENDED` as it was.
  pub fn release(&self) {
    self.status.fetch_and(!StatusFlags::RUNNING.bits(), Ordering::SeqCst);
  }

  /// Returns `true` if the mailbox was not already suspended.
  pub fn suspend(&self) -> bool {
    let prev = self.status.fetch_or(StatusFlags::SUSPENDED.bits(), Ordering::SeqCst);
    !StatusFlags::from_bits_truncate(prev).contains(StatusFlags::SUSPENDED)
  }

  /// Returns `true` if the mailbox was suspended.
  pub fn resume(&self) -> bool {
    let prev = self.status.fetch_and(!StatusFlags::SUSPENDED.bits(), Ordering::SeqCst);
    StatusFlags::from_bits_truncate(prev).contains(StatusFlags::SUSPENDED)
  }
}

/// How a drain burst ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BurstOutcome {
  /// Both channels were empty at the last inspection.
  Drained,
  /// The burst budget ran out; more work may remain.
  Yielded,
  /// The mailbox was suspended mid-drain.
  Suspended,
}

/// A mailbox whose queues can be drained by the scheduler.
pub(crate) trait DrainTarget: Send + Sync + Sized + 'static {
  fn scheduler(&self) -> &SchedulerState;
  fn dispatcher(&self) -> &Arc<dyn Dispatcher>;
  fn observer(&self) -> Option<&Arc<dyn MailboxObserver>>;
  fn has_messages(&self) -> bool;
  /// Pops and dispatches messages until empty, suspended or out of budget.
  fn run_burst(&self) -> BurstOutcome;

  fn notify(&self, event: MailboxEvent) {
    if let Some(observer) = self.observer() {
      observer.on_event(event);
    }
  }
}

/// Records pending work and starts a drain unless one already owns the mailbox.
pub(crate) fn schedule<T: DrainTarget>(target: &Arc<T>) {
  let state = target.scheduler();
  state.mark_pending();
  if state.try_acquire() {
    trace!("Mailbox idle -> running, submitting drain");
    target.notify(MailboxEvent::MailboxStarted);
    submit(target.clone());
  }
}

fn submit<T: DrainTarget>(target: Arc<T>) {
  let dispatcher = target.dispatcher().clone();
  dispatcher.schedule(Box::new(move || run(target)));
}

/// Executes one drain burst. Only ever called while holding `RUNNING`.
fn run<T: DrainTarget>(target: Arc<T>) {
  // This burst will observe everything enqueued so far.
  target.scheduler().clear_pending();

  let guard = DrainGuard::new(&target);
  let outcome = target.run_burst();
  guard.waive();

  match outcome {
    BurstOutcome::Yielded => {
      // RUNNING is kept across the yield so no other drain can start.
      trace!("Mailbox drain yielding, re-submitting");
      submit(target);
    }
    BurstOutcome::Drained => {
      target.notify(MailboxEvent::MailboxEmpty);
      go_idle(&target);
    }
    BurstOutcome::Suspended => {
      trace!("Mailbox drain stopped by suspension");
      go_idle(&target);
    }
  }
}

fn go_idle<T: DrainTarget>(target: &Arc<T>) {
  let state = target.scheduler();
  state.release();
  // A post may have landed between the last empty check and the release.
  if state.take_pending() {
    trace!("Mailbox received messages while going idle, re-arming");
    schedule(target);
  }
}
