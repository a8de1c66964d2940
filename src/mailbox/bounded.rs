// src/mailbox/bounded.rs

//! A mailbox backed by fixed-capacity queues that applies backpressure to posters.

use crate::error::MailboxError;
use crate::mailbox::observer::{MailboxEvent, MailboxObserver, MessageChannel};
use crate::mailbox::options::BoundedMailboxConfig;
use crate::mailbox::scheduler::{self, BurstOutcome, DrainTarget, MailboxStatus, SchedulerState};
use crate::mailbox::{HandlerSlot, Mailbox, MailboxProducer, SystemInvoke, UserInvoke};
use crate::runtime::{dispatcher, Dispatcher, MessageQueue};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use static_assertions::assert_impl_all;
use tracing::{debug, trace};

struct BoundedInner<U, S> {
  throughput: usize,
  user_queue: MessageQueue<U>,
  system_queue: MessageQueue<S>,
  scheduler: SchedulerState,
  handlers: HandlerSlot<U, S>,
  dispatcher: Arc<dyn Dispatcher>,
  observer: Option<Arc<dyn MailboxObserver>>,
}

impl<U, S> BoundedInner<U, S>
where
  U: Send + 'static,
  S: Send + 'static,
{
  fn admitted(self: &Arc<Self>, channel: MessageChannel) {
    trace!(channel = channel.as_str(), "Message posted to bounded mailbox");
    self.notify(MailboxEvent::MessagePosted { channel });
    scheduler::schedule(self);
  }
}

impl<U, S> DrainTarget for BoundedInner<U, S>
where
  U: Send + 'static,
  S: Send + 'static,
{
  fn scheduler(&self) -> &SchedulerState {
    &self.scheduler
  }

  fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
    &self.dispatcher
  }

  fn observer(&self) -> Option<&Arc<dyn MailboxObserver>> {
    self.observer.as_ref()
  }

  fn has_messages(&self) -> bool {
    !self.system_queue.is_empty() || !self.user_queue.is_empty()
  }

  fn run_burst(&self) -> BurstOutcome {
    let Some(handlers) = self.handlers.get() else {
      // Posts are rejected until handlers exist, so there is nothing to drain.
      return BurstOutcome::Drained;
    };

    for _ in 0..self.throughput {
      if self.scheduler.is_suspended() {
        return BurstOutcome::Suspended;
      }
      // One system message at a time, always ahead of user messages.
      if let Some(message) = self.system_queue.try_pop() {
        self.notify(MailboxEvent::MessageReceived {
          channel: MessageChannel::System,
          count: 1,
        });
        (handlers.system)(message);
      } else if let Some(message) = self.user_queue.try_pop() {
        self.notify(MailboxEvent::MessageReceived {
          channel: MessageChannel::User,
          count: 1,
        });
        (handlers.user)(message);
      } else {
        return BurstOutcome::Drained;
      }
    }
    BurstOutcome::Yielded
  }
}

/// A mailbox whose user and system channels have fixed capacities.
///
/// Posting to a full channel waits (or parks the thread, for the blocking
/// variants) until the drain frees a slot; messages are never dropped.
/// A drain handles at most `throughput` messages before yielding its
/// execution slot to other mailboxes. Cloning yields another handle to
/// the same mailbox.
pub struct BoundedMailbox<U, S> {
  inner: Arc<BoundedInner<U, S>>,
}

assert_impl_all!(BoundedMailbox<String, String>: Send, Sync, Clone);

impl<U, S> BoundedMailbox<U, S>
where
  U: Send + 'static,
  S: Send + 'static,
{
  fn with_dispatcher(config: &BoundedMailboxConfig, dispatcher: Arc<dyn Dispatcher>) -> Self {
    let inner = BoundedInner {
      throughput: config.throughput,
      user_queue: MessageQueue::bounded(config.capacity),
      system_queue: MessageQueue::bounded(config.system_capacity),
      scheduler: SchedulerState::new(),
      handlers: HandlerSlot::new(),
      dispatcher,
      observer: config.observer.clone(),
    };
    Self { inner: Arc::new(inner) }
  }

  /// Builds a producer that closes over `config`.
  ///
  /// The dispatcher is resolved here, so without an explicit one this must be
  /// called from within a Tokio runtime.
  pub fn producer(config: BoundedMailboxConfig) -> Result<MailboxProducer<Self>, MailboxError> {
    config.validate()?;
    let dispatcher = dispatcher::resolve(config.dispatcher.clone())?;
    debug!(
      throughput = config.throughput,
      capacity = config.capacity,
      system_capacity = config.system_capacity,
      "Created bounded mailbox producer"
    );
    Ok(MailboxProducer::new(move || {
      BoundedMailbox::with_dispatcher(&config, dispatcher.clone())
    }))
  }

  pub fn throughput(&self) -> usize {
    self.inner.throughput
  }

  pub fn capacity(&self) -> usize {
    self.inner.user_queue.capacity().unwrap_or(usize::MAX)
  }

  pub fn system_capacity(&self) -> usize {
    self.inner.system_queue.capacity().unwrap_or(usize::MAX)
  }
}

/// Returns a producer of bounded mailboxes with the given drain `throughput`
/// and user channel capacity `size`, using default settings otherwise.
pub fn bounded_mailbox<U, S>(
  throughput: usize,
  size: usize,
) -> Result<MailboxProducer<BoundedMailbox<U, S>>, MailboxError>
where
  U: Send + 'static,
  S: Send + 'static,
{
  BoundedMailbox::producer(BoundedMailboxConfig::new(throughput, size))
}

#[async_trait]
impl<U, S> Mailbox for BoundedMailbox<U, S>
where
  U: Send + 'static,
  S: Send + 'static,
{
  type User = U;
  type System = S;
  type Delivery = U;

  async fn post_user_message(&self, message: U) -> Result<(), MailboxError> {
    self.inner.handlers.ensure_registered(MessageChannel::User)?;
    self.inner.user_queue.push(message).await?;
    self.inner.admitted(MessageChannel::User);
    Ok(())
  }

  fn post_user_message_blocking(&self, message: U) -> Result<(), MailboxError> {
    self.inner.handlers.ensure_registered(MessageChannel::User)?;
    self.inner.user_queue.push_blocking(message)?;
    self.inner.admitted(MessageChannel::User);
    Ok(())
  }

  async fn post_system_message(&self, message: S) -> Result<(), MailboxError> {
    self.inner.handlers.ensure_registered(MessageChannel::System)?;
    self.inner.system_queue.push(message).await?;
    self.inner.admitted(MessageChannel::System);
    Ok(())
  }

  fn post_system_message_blocking(&self, message: S) -> Result<(), MailboxError> {
    self.inner.handlers.ensure_registered(MessageChannel::System)?;
    self.inner.system_queue.push_blocking(message)?;
    self.inner.admitted(MessageChannel::System);
    Ok(())
  }

  fn register_handlers(&self, user_invoke: UserInvoke<U>, system_invoke: SystemInvoke<S>) -> Result<(), MailboxError> {
    self.inner.handlers.register(user_invoke, system_invoke)
  }

  fn suspend(&self) {
    if self.inner.scheduler.suspend() {
      debug!("Bounded mailbox suspended");
    }
  }

  fn resume(&self) {
    if self.inner.scheduler.resume() {
      debug!(queued = self.inner.has_messages(), "Bounded mailbox resumed");
    }
    if self.inner.has_messages() {
      scheduler::schedule(&self.inner);
    }
  }

  fn user_message_count(&self) -> usize {
    self.inner.user_queue.len()
  }

  fn system_message_count(&self) -> usize {
    self.inner.system_queue.len()
  }

  fn status(&self) -> MailboxStatus {
    self.inner.scheduler.status()
  }

  fn is_suspended(&self) -> bool {
    self.inner.scheduler.is_suspended()
  }
}

impl<U, S> Clone for BoundedMailbox<U, S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<U, S> fmt::Debug for BoundedMailbox<U, S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BoundedMailbox")
      .field("throughput", &self.inner.throughput)
      .field("user_messages", &self.inner.user_queue.len())
      .field("system_messages", &self.inner.system_queue.len())
      .field("status", &self.inner.scheduler.status())
      .field("suspended", &self.inner.scheduler.is_suspended())
      .finish()
  }
}
