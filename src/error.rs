// src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum MailboxError {
  // --- Usage Errors ---
  /// A message was posted before the owning runtime bound its handlers.
  /// The message is not enqueued.
  #[error("Mailbox handlers are not registered")]
  HandlersNotRegistered,
  #[error("Mailbox handlers are already registered")]
  HandlersAlreadyRegistered,

  // --- Configuration Errors ---
  #[error("Invalid mailbox configuration: {0}")]
  InvalidConfig(String),
  #[error("No Tokio runtime available to run mailbox drain tasks")]
  NoRuntime,

  // --- Internal Errors ---
  /// The backing queue was closed. A mailbox owns both ends of its queues,
  /// so this only surfaces if that invariant is broken.
  #[error("Mailbox queue is closed")]
  Closed,
}

impl MailboxError {
  pub(crate) fn invalid_config(field: &'static str, value: usize) -> Self {
    MailboxError::InvalidConfig(format!("{} must be greater than zero (got {})", field, value))
  }
}
