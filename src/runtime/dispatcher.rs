// src/runtime/dispatcher.rs

//! Submission of short-lived drain tasks to an execution pool.

use crate::error::MailboxError;

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;

/// A unit of work submitted to a [`Dispatcher`].
pub type Runnable = Box<dyn FnOnce() + Send + 'static>;

/// Executes mailbox drain work on some shared pool of threads or tasks.
///
/// Mailboxes never own a thread. Each drain burst is submitted as one `Runnable`,
/// and a burst that exhausts its budget re-submits itself instead of spinning.
pub trait Dispatcher: Send + Sync + 'static {
  fn schedule(&self, runnable: Runnable);
}

/// Dispatches drain bursts as tasks on a Tokio runtime.
#[derive(Clone)]
pub struct TokioDispatcher {
  handle: Handle,
}

impl TokioDispatcher {
  pub fn new(handle: Handle) -> Self {
    Self { handle }
  }

  /// Captures the runtime the caller is running in.
  pub fn current() -> Result<Self, MailboxError> {
    Handle::try_current()
      .map(Self::new)
      .map_err(|_| MailboxError::NoRuntime)
  }
}

impl fmt::Debug for TokioDispatcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TokioDispatcher")
      .field("flavor", &self.handle.runtime_flavor())
      .finish()
  }
}

impl Dispatcher for TokioDispatcher {
  fn schedule(&self, runnable: Runnable) {
    // A panicking handler unwinds out of this task; Tokio reports it on the JoinHandle.
    self.handle.spawn(async move { runnable() });
  }
}

/// Resolves the dispatcher a mailbox producer should use.
pub(crate) fn resolve(explicit: Option<Arc<dyn Dispatcher>>) -> Result<Arc<dyn Dispatcher>, MailboxError> {
  match explicit {
    Some(dispatcher) => Ok(dispatcher),
    None => Ok(Arc::new(TokioDispatcher::current()?)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;
  use tokio::sync::oneshot;

  #[test]
  fn current_fails_outside_runtime() {
    assert!(matches!(TokioDispatcher::current(), Err(MailboxError::NoRuntime)));
  }

  #[tokio::test]
  async fn runs_submitted_work() {
    let dispatcher = TokioDispatcher::current().unwrap();
    let (tx, rx) = oneshot::channel();
    dispatcher.schedule(Box::new(move || {
      let _ = tx.send(42);
    }));
    let value = tokio::time::timeout(Duration::from_millis(500), rx).await.unwrap().unwrap();
    assert_eq!(value, 42);
  }
}
