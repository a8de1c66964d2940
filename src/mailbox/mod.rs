// src/mailbox/mod.rs

//! Per-actor mailboxes: the `Mailbox` contract, its two variants and their producers.

mod drain_guard;
pub(crate) mod scheduler;

pub mod batching;
pub mod bounded;
pub mod observer;
pub mod options;

pub use batching::{unbounded_batching_mailbox, UnboundedBatchingMailbox};
pub use bounded::{bounded_mailbox, BoundedMailbox};
pub use observer::{MailboxEvent, MailboxObserver, MessageChannel};
pub use options::{BoundedMailboxConfig, UnboundedBatchingMailboxConfig};
pub use scheduler::MailboxStatus;

use crate::error::MailboxError;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

/// Callback receiving user-channel deliveries.
pub type UserInvoke<D> = Box<dyn Fn(D) + Send + Sync + 'static>;

/// Callback receiving system messages.
pub type SystemInvoke<S> = Box<dyn Fn(S) + Send + Sync + 'static>;

/// The runtime-facing contract shared by every mailbox variant.
///
/// Any number of threads or tasks may post concurrently. Handlers run on
/// short-lived drain tasks, never concurrently with themselves for the same
/// mailbox, and system messages are always dispatched before queued user messages.
#[async_trait]
pub trait Mailbox: Send + Sync {
  /// Payload of the user channel.
  type User: Send + 'static;
  /// Payload of the system channel.
  type System: Send + 'static;
  /// What one user handler invocation receives.
  type Delivery: Send + 'static;

  /// Enqueues a user message, waiting while a bounded channel is full.
  async fn post_user_message(&self, message: Self::User) -> Result<(), MailboxError>;

  /// Like [`Mailbox::post_user_message`] but parks the calling thread instead of awaiting.
  /// Must not be called from within an async task.
  fn post_user_message_blocking(&self, message: Self::User) -> Result<(), MailboxError>;

  /// Enqueues a system message on its own prioritized channel.
  async fn post_system_message(&self, message: Self::System) -> Result<(), MailboxError>;

  fn post_system_message_blocking(&self, message: Self::System) -> Result<(), MailboxError>;

  /// Binds the two handlers. Must be called exactly once, before any post.
  fn register_handlers(
    &self,
    user_invoke: UserInvoke<Self::Delivery>,
    system_invoke: SystemInvoke<Self::System>,
  ) -> Result<(), MailboxError>;

  /// Withholds drains until [`Mailbox::resume`]. Posts keep queueing.
  fn suspend(&self);

  /// Lifts a suspension and drains whatever queued meanwhile.
  fn resume(&self);

  fn user_message_count(&self) -> usize;

  fn system_message_count(&self) -> usize;

  fn has_messages(&self) -> bool {
    self.user_message_count() > 0 || self.system_message_count() > 0
  }

  fn status(&self) -> MailboxStatus;

  fn is_suspended(&self) -> bool;
}

// --- Handler bindings ---

pub(crate) struct Handlers<D, S> {
  pub user: UserInvoke<D>,
  pub system: SystemInvoke<S>,
}

/// Write-once handler slot shared by the mailbox variants.
pub(crate) struct HandlerSlot<D, S> {
  cell: OnceCell<Handlers<D, S>>,
}

impl<D, S> HandlerSlot<D, S> {
  pub fn new() -> Self {
    Self { cell: OnceCell::new() }
  }

  pub fn register(&self, user: UserInvoke<D>, system: SystemInvoke<S>) -> Result<(), MailboxError> {
    self
      .cell
      .set(Handlers { user, system })
      .map_err(|_| MailboxError::HandlersAlreadyRegistered)?;
    debug!("Mailbox handlers registered");
    Ok(())
  }

  pub fn get(&self) -> Option<&Handlers<D, S>> {
    self.cell.get()
  }

  /// Rejects posts that arrive before the runtime wired the mailbox.
  pub fn ensure_registered(&self, channel: MessageChannel) -> Result<(), MailboxError> {
    if self.cell.get().is_some() {
      Ok(())
    } else {
      warn!(
        channel = channel.as_str(),
        "Rejecting post to mailbox without registered handlers"
      );
      Err(MailboxError::HandlersNotRegistered)
    }
  }
}

// --- Producer ---

/// Creates fresh, identically configured mailboxes, one per actor.
pub struct MailboxProducer<M> {
  factory: Arc<dyn Fn() -> M + Send + Sync>,
}

impl<M> MailboxProducer<M> {
  pub fn new<F>(factory: F) -> Self
  where
    F: Fn() -> M + Send + Sync + 'static,
  {
    Self {
      factory: Arc::new(factory),
    }
  }

  /// Allocates a new mailbox with empty queues, idle and without handlers.
  pub fn produce(&self) -> M {
    (self.factory)()
  }

  /// Returns the producer as a plain zero-argument factory function.
  pub fn into_fn(self) -> impl Fn() -> M + Send + Sync + Clone {
    let factory = self.factory;
    move || factory()
  }
}

impl<M> Clone for MailboxProducer<M> {
  fn clone(&self) -> Self {
    Self {
      factory: self.factory.clone(),
    }
  }
}

impl<M> fmt::Debug for MailboxProducer<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MailboxProducer").finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn handler_slot_registers_once() {
    let slot: HandlerSlot<u32, u32> = HandlerSlot::new();
    assert_eq!(
      slot.ensure_registered(MessageChannel::User),
      Err(MailboxError::HandlersNotRegistered)
    );
    slot.register(Box::new(|_| {}), Box::new(|_| {})).unwrap();
    assert!(slot.get().is_some());
    assert!(slot.ensure_registered(MessageChannel::System).is_ok());
    assert_eq!(
      slot.register(Box::new(|_| {}), Box::new(|_| {})),
      Err(MailboxError::HandlersAlreadyRegistered)
    );
  }

  #[test]
  fn producer_builds_fresh_values() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    let producer = MailboxProducer::new(move || counter.fetch_add(1, Ordering::SeqCst));
    assert_eq!(producer.produce(), 0);
    let as_fn = producer.clone().into_fn();
    assert_eq!(as_fn(), 1);
    assert_eq!(producer.produce(), 2);
  }
}
