// src/mailbox/options.rs

use crate::error::MailboxError;
use crate::mailbox::observer::MailboxObserver;
use crate::runtime::Dispatcher;

use std::fmt;
use std::sync::Arc;

/// Default number of messages a bounded mailbox drains before yielding.
pub const DEFAULT_THROUGHPUT: usize = 300;
/// Default capacity of a bounded mailbox's user channel.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;
/// Default capacity of a bounded mailbox's system channel.
pub const DEFAULT_SYSTEM_MAILBOX_CAPACITY: usize = 100;
/// Default maximum number of user messages per batched invocation.
pub const DEFAULT_BATCH_SIZE: usize = 64;

// --- Bounded ---

/// Configuration shared by every mailbox a bounded producer creates.
#[derive(Clone)]
pub struct BoundedMailboxConfig {
  /// Messages drained per burst before the drain yields its execution slot.
  pub throughput: usize,
  /// User channel capacity. Posting beyond it waits for drainage.
  pub capacity: usize,
  /// System channel capacity, independent of `capacity`.
  pub system_capacity: usize,
  /// Where drain bursts run. `None` captures the current Tokio runtime.
  pub dispatcher: Option<Arc<dyn Dispatcher>>,
  pub observer: Option<Arc<dyn MailboxObserver>>,
}

impl BoundedMailboxConfig {
  pub fn new(throughput: usize, capacity: usize) -> Self {
    Self {
      throughput,
      capacity,
      ..Self::default()
    }
  }

  pub fn with_system_capacity(mut self, system_capacity: usize) -> Self {
    self.system_capacity = system_capacity;
    self
  }

  pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
    self.dispatcher = Some(dispatcher);
    self
  }

  pub fn with_observer(mut self, observer: Arc<dyn MailboxObserver>) -> Self {
    self.observer = Some(observer);
    self
  }

  pub(crate) fn validate(&self) -> Result<(), MailboxError> {
    if self.throughput == 0 {
      return Err(MailboxError::invalid_config("throughput", self.throughput));
    }
    if self.capacity == 0 {
      return Err(MailboxError::invalid_config("capacity", self.capacity));
    }
    if self.system_capacity == 0 {
      return Err(MailboxError::invalid_config("system_capacity", self.system_capacity));
    }
    Ok(())
  }
}

impl Default for BoundedMailboxConfig {
  fn default() -> Self {
    Self {
      throughput: DEFAULT_THROUGHPUT,
      capacity: DEFAULT_MAILBOX_CAPACITY,
      system_capacity: DEFAULT_SYSTEM_MAILBOX_CAPACITY,
      dispatcher: None,
      observer: None,
    }
  }
}

impl fmt::Debug for BoundedMailboxConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BoundedMailboxConfig")
      .field("throughput", &self.throughput)
      .field("capacity", &self.capacity)
      .field("system_capacity", &self.system_capacity)
      .field("dispatcher", &self.dispatcher.is_some())
      .field("observer", &self.observer.is_some())
      .finish()
  }
}

// --- Unbounded batching ---

/// Configuration shared by every mailbox an unbounded batching producer creates.
#[derive(Clone)]
pub struct UnboundedBatchingMailboxConfig {
  /// Maximum number of user messages handed to the user handler in one call.
  pub batch_size: usize,
  pub dispatcher: Option<Arc<dyn Dispatcher>>,
  pub observer: Option<Arc<dyn MailboxObserver>>,
}

impl UnboundedBatchingMailboxConfig {
  pub fn new(batch_size: usize) -> Self {
    Self {
      batch_size,
      ..Self::default()
    }
  }

  pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
    self.dispatcher = Some(dispatcher);
    self
  }

  pub fn with_observer(mut self, observer: Arc<dyn MailboxObserver>) -> Self {
    self.observer = Some(observer);
    self
  }

  pub(crate) fn validate(&self) -> Result<(), MailboxError> {
    if self.batch_size == 0 {
      return Err(MailboxError::invalid_config("batch_size", self.batch_size));
    }
    Ok(())
  }
}

impl Default for UnboundedBatchingMailboxConfig {
  fn default() -> Self {
    Self {
      batch_size: DEFAULT_BATCH_SIZE,
      dispatcher: None,
      observer: None,
    }
  }
}

impl fmt::Debug for UnboundedBatchingMailboxConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("UnboundedBatchingMailboxConfig")
      .field("batch_size", &self.batch_size)
      .field("dispatcher", &self.dispatcher.is_some())
      .field("observer", &self.observer.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    assert!(BoundedMailboxConfig::default().validate().is_ok());
    assert!(UnboundedBatchingMailboxConfig::default().validate().is_ok());
  }

  #[test]
  fn zero_values_are_rejected() {
    assert!(matches!(
      BoundedMailboxConfig::new(0, 10).validate(),
      Err(MailboxError::InvalidConfig(_))
    ));
    assert!(matches!(
      BoundedMailboxConfig::new(10, 0).validate(),
      Err(MailboxError::InvalidConfig(_))
    ));
    assert!(matches!(
      BoundedMailboxConfig::new(10, 10).with_system_capacity(0).validate(),
      Err(MailboxError::InvalidConfig(_))
    ));
    assert!(matches!(
      UnboundedBatchingMailboxConfig::new(0).validate(),
      Err(MailboxError::InvalidConfig(_))
    ));
  }

  #[test]
  fn new_keeps_default_system_capacity() {
    let config = BoundedMailboxConfig::new(10, 2);
    assert_eq!(config.throughput, 10);
    assert_eq!(config.capacity, 2);
    assert_eq!(config.system_capacity, DEFAULT_SYSTEM_MAILBOX_CAPACITY);
  }
}
