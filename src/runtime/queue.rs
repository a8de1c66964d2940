// src/runtime/queue.rs

//! Concurrent message queues backing mailbox channels, based on `async-channel`.

use crate::error::MailboxError;

use async_channel::{Receiver, Sender, TryRecvError};

/// A multi-producer, multi-consumer FIFO queue that owns both ends of its channel.
///
/// Because the queue holds its own `Receiver`, the channel never closes while the
/// queue is alive. Pushes therefore only wait on capacity, never on disconnection.
#[derive(Debug)]
pub(crate) struct MessageQueue<T> {
  tx: Sender<T>,
  rx: Receiver<T>,
}

impl<T> MessageQueue<T> {
  /// Creates a fixed-capacity queue. Pushes wait while `capacity` messages are queued.
  pub fn bounded(capacity: usize) -> Self {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    Self { tx, rx }
  }

  /// Creates a queue without a capacity limit. Pushes never wait.
  pub fn unbounded() -> Self {
    let (tx, rx) = async_channel::unbounded();
    Self { tx, rx }
  }

  /// Enqueues a message, waiting asynchronously for a free slot when full.
  pub async fn push(&self, message: T) -> Result<(), MailboxError> {
    self.tx.send(message).await.map_err(|_| MailboxError::Closed)
  }

  /// Enqueues a message, parking the calling thread while the queue is full.
  ///
  /// Must not be called from inside an async task; use [`MessageQueue::push`] there.
  pub fn push_blocking(&self, message: T) -> Result<(), MailboxError> {
    self.tx.send_blocking(message).map_err(|_| MailboxError::Closed)
  }

  /// Pops the oldest message. An empty queue (or a lost pop race) yields `None`.
  pub fn try_pop(&self) -> Option<T> {
    match self.rx.try_recv() {
      Ok(message) => Some(message),
      Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
    }
  }

  /// Pops up to `max` messages in arrival order.
  pub fn pop_many(&self, max: usize) -> Vec<T> {
    let mut batch = Vec::with_capacity(max.min(self.len()));
    while batch.len() < max {
      match self.try_pop() {
        Some(message) => batch.push(message),
        None => break,
      }
    }
    batch
  }

  pub fn len(&self) -> usize {
    self.rx.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rx.is_empty()
  }

  /// Returns the capacity limit, or `None` for an unbounded queue.
  pub fn capacity(&self) -> Option<usize> {
    self.tx.capacity()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pops_in_fifo_order() {
    let queue = MessageQueue::unbounded();
    for i in 0..5 {
      queue.push_blocking(i).unwrap();
    }
    assert_eq!(queue.len(), 5);
    assert_eq!(queue.try_pop(), Some(0));
    assert_eq!(queue.pop_many(3), vec![1, 2, 3]);
    assert_eq!(queue.pop_many(3), vec![4]);
    assert!(queue.pop_many(3).is_empty());
    assert!(queue.try_pop().is_none());
  }

  #[test]
  fn bounded_reports_capacity() {
    let queue: MessageQueue<u8> = MessageQueue::bounded(2);
    assert_eq!(queue.capacity(), Some(2));
    let unbounded: MessageQueue<u8> = MessageQueue::unbounded();
    assert_eq!(unbounded.capacity(), None);
  }

  #[tokio::test]
  async fn bounded_push_waits_for_free_slot() {
    use std::time::Duration;
    use tokio::time::timeout;

    let queue = std::sync::Arc::new(MessageQueue::bounded(1));
    queue.push("a").await.unwrap();

    let blocked = timeout(Duration::from_millis(20), queue.push("b")).await;
    assert!(blocked.is_err(), "push into a full queue should wait");

    assert_eq!(queue.try_pop(), Some("a"));
    timeout(Duration::from_millis(100), queue.push("c"))
      .await
      .expect("push should complete once a slot frees")
      .unwrap();
    assert_eq!(queue.try_pop(), Some("c"));
  }
}
