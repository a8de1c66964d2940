//! Statistics hooks for mailbox activity.

/// The channel a message travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageChannel {
  /// Control-plane messages, always drained first.
  System,
  /// Ordinary actor messages.
  User,
}

impl MessageChannel {
  pub fn as_str(&self) -> &'static str {
    match self {
      MessageChannel::System => "system",
      MessageChannel::User => "user",
    }
  }
}

/// Activity reported to a [`MailboxObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxEvent {
  /// A post won the idle -> running transition and a drain was submitted.
  MailboxStarted,
  /// A message was admitted to one of the channels.
  MessagePosted { channel: MessageChannel },
  /// A handler is about to receive `count` messages (more than one only for user batches).
  MessageReceived { channel: MessageChannel, count: usize },
  /// A drain found both channels empty and is going idle.
  MailboxEmpty,
}

/// Receives mailbox activity events.
///
/// Called synchronously on posting threads and inside drain bursts, so
/// implementations should be cheap and must not block.
pub trait MailboxObserver: Send + Sync + 'static {
  fn on_event(&self, event: MailboxEvent);
}

impl<F> MailboxObserver for F
where
  F: Fn(MailboxEvent) + Send + Sync + 'static,
{
  fn on_event(&self, event: MailboxEvent) {
    self(event)
  }
}
