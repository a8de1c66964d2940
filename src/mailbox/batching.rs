// src/mailbox/batching.rs

//! An unbounded mailbox that hands user messages to its handler in batches.

use crate::error::MailboxError;
use crate::mailbox::observer::{MailboxEvent, MailboxObserver, MessageChannel};
use crate::mailbox::options::UnboundedBatchingMailboxConfig;
use crate::mailbox::scheduler::{self, BurstOutcome, DrainTarget, MailboxStatus, SchedulerState};
use crate::mailbox::{HandlerSlot, Mailbox, MailboxProducer, SystemInvoke, UserInvoke};
use crate::runtime::{dispatcher, Dispatcher, MessageQueue};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use static_assertions::assert_impl_all;
use tracing::{debug, trace};

struct BatchingInner<U, S> {
  batch_size: usize,
  user_queue: MessageQueue<U>,
  system_queue: MessageQueue<S>,
  scheduler: SchedulerState,
  handlers: HandlerSlot<Vec<U>, S>,
  dispatcher: Arc<dyn Dispatcher>,
  observer: Option<Arc<dyn MailboxObserver>>,
}

impl<U, S> BatchingInner<U, S>
where
  U: Send + 'static,
  S: Send + 'static,
{
  fn post_user(self: &Arc<Self>, message: U) -> Result<(), MailboxError> {
    self.handlers.ensure_registered(MessageChannel::User)?;
    self.user_queue.push_blocking(message)?;
    self.admitted(MessageChannel::User);
    Ok(())
  }

  fn post_system(self: &Arc<Self>, message: S) -> Result<(), MailboxError> {
    self.handlers.ensure_registered(MessageChannel::System)?;
    self.system_queue.push_blocking(message)?;
    self.admitted(MessageChannel::System);
    Ok(())
  }

  fn admitted(self: &Arc<Self>, channel: MessageChannel) {
    trace!(channel = channel.as_str(), "Message posted to batching mailbox");
    self.notify(MailboxEvent::MessagePosted { channel });
    scheduler::schedule(self);
  }
}

impl<U, S> DrainTarget for BatchingInner<U, S>
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

  /// Dispatches one system message or one user batch, then yields.
  fn run_burst(&self) -> BurstOutcome {
    let Some(handlers) = self.handlers.get() else {
      return BurstOutcome::Drained;
    };
    if self.scheduler.is_suspended() {
      return BurstOutcome::Suspended;
    }

    if let Some(message) = self.system_queue.try_pop() {
      self.notify(MailboxEvent::MessageReceived {
        channel: MessageChannel::System,
        count: 1,
      });
      (handlers.system)(message);
      return BurstOutcome::Yielded;
    }

    let batch = self.user_queue.pop_many(self.batch_size);
    if batch.is_empty() {
      return BurstOutcome::Drained;
    }
    trace!(size = batch.len(), "Delivering user batch");
    self.notify(MailboxEvent::MessageReceived {
      channel: MessageChannel::User,
      count: batch.len(),
    });
    (handlers.user)(batch);
    BurstOutcome::Yielded
  }
}

/// A mailbox with unbounded channels whose user handler receives batches.
///
/// Each user invocation carries up to `batch_size` messages in arrival order.
/// Posting never waits. The drain runs until both channels are empty, yielding
/// its execution slot after every system message or batch.
pub struct UnboundedBatchingMailbox<U, S> {
  inner: Arc<BatchingInner<U, S>>,
}

assert_impl_all!(UnboundedBatchingMailbox<String, String>: Send, Sync, Clone);

impl<U, S> UnboundedBatchingMailbox<U, S>
where
  U: Send + 'static,
  S: Send + 'static,
{
  fn with_dispatcher(config: &UnboundedBatchingMailboxConfig, dispatcher: Arc<dyn Dispatcher>) -> Self {
    let inner = BatchingInner {
      batch_size: config.batch_size,
      user_queue: MessageQueue::unbounded(),
      system_queue: MessageQueue::unbounded(),
      scheduler: SchedulerState::new(),
      handlers: HandlerSlot::new(),
      dispatcher,
      observer: config.observer.clone(),
    };
    Self { inner: Arc::new(inner) }
  }

  /// Builds a producer that closes over `config`.
  pub fn producer(config: UnboundedBatchingMailboxConfig) -> Result<MailboxProducer<Self>, MailboxError> {
    config.validate()?;
    let dispatcher = dispatcher::resolve(config.dispatcher.clone())?;
    debug!(batch_size = config.batch_size, "Created unbounded batching mailbox producer");
    Ok(MailboxProducer::new(move || {
      UnboundedBatchingMailbox::with_dispatcher(&config, dispatcher.clone())
    }))
  }

  pub fn batch_size(&self) -> usize {
    self.inner.batch_size
  }
}

/// Returns a producer of unbounded batching mailboxes delivering up to
/// `batch_size` user messages per invocation.
pub fn unbounded_batching_mailbox<U, S>(
  batch_size: usize,
) -> Result<MailboxProducer<UnboundedBatchingMailbox<U, S>>, MailboxError>
where
  U: Send + 'static,
  S: Send + 'static,
{
  UnboundedBatchingMailbox::producer(UnboundedBatchingMailboxConfig::new(batch_size))
}

#[async_trait]
impl<U, S> Mailbox for UnboundedBatchingMailbox<U, S>
where
  U: Send + 'static,
  S: Send + 'static,
{
  type User = U;
  type System = S;
  type Delivery = Vec<U>;

  async fn post_user_message(&self, message: U) -> Result<(), MailboxError> {
    // Unbounded: admission never waits.
    self.inner.post_user(message)
  }

  fn post_user_message_blocking(&self, message: U) -> Result<(), MailboxError> {
    self.inner.post_user(message)
  }

  async fn post_system_message(&self, message: S) -> Result<(), MailboxError> {
    self.inner.post_system(message)
  }

  fn post_system_message_blocking(&self, message: S) -> Result<(), MailboxError> {
    self.inner.post_system(message)
  }

  fn register_handlers(
    &self,
    user_invoke: UserInvoke<Vec<U>>,
    system_invoke: SystemInvoke<S>,
  ) -> Result<(), MailboxError> {
    self.inner.handlers.register(user_invoke, system_invoke)
  }

  fn suspend(&self) {
    if self.inner.scheduler.suspend() {
      debug!("Batching mailbox suspended");
    }
  }

  fn resume(&self) {
    if self.inner.scheduler.resume() {
      debug!(queued = self.inner.has_messages(), "Batching mailbox resumed");
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

impl<U, S> Clone for UnboundedBatchingMailbox<U, S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<U, S> fmt::Debug for UnboundedBatchingMailbox<U, S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("UnboundedBatchingMailbox")
      .field("batch_size", &self.inner.batch_size)
      .field("user_messages", &self.inner.user_queue.len())
      .field("system_messages", &self.inner.system_queue.len())
      .field("status", &self.inner.scheduler.status())
      .field("suspended", &self.inner.scheduler.is_suspended())
      .finish()
  }
}
