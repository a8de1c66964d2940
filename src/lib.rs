// src/lib.rs

//! actor-mailbox - message delivery and drain scheduling for actor runtimes.
//!
//! A mailbox buffers the user and system messages sent to one actor and drives
//! their sequential processing on short-lived drain tasks instead of a dedicated
//! thread per actor. At most one drain owns a mailbox at any instant, system
//! messages are dispatched ahead of user messages, and a post that races with a
//! drain going idle is never stranded.
//!
//! Two variants share the [`Mailbox`] contract:
//! - [`BoundedMailbox`]: fixed-capacity channels with backpressure and a
//!   per-burst throughput budget.
//! - [`UnboundedBatchingMailbox`]: unbounded channels, user messages delivered
//!   in batches.
//!
//! # Example
//! ```no_run
//! use actor_mailbox::{bounded_mailbox, BoundedMailbox, Mailbox};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), actor_mailbox::MailboxError> {
//!   let producer = bounded_mailbox::<String, u8>(100, 1024)?;
//!   let mailbox: BoundedMailbox<String, u8> = producer.produce();
//!   mailbox.register_handlers(
//!     Box::new(|msg| println!("user: {}", msg)),
//!     Box::new(|sys| println!("system: {}", sys)),
//!   )?;
//!   mailbox.post_user_message("hello".to_string()).await?;
//!   Ok(())
//! }
//! ```

/// Defines the error type returned by mailbox operations.
pub mod error;
/// The `Mailbox` contract, its variants, producers and configuration.
pub mod mailbox;
/// Backing queues and the dispatcher drain tasks run on.
pub mod runtime;

// Re-export core types for user convenience.
pub use error::MailboxError;
pub use mailbox::{
  bounded_mailbox, unbounded_batching_mailbox, BoundedMailbox, BoundedMailboxConfig, Mailbox, MailboxEvent,
  MailboxObserver, MailboxProducer, MailboxStatus, MessageChannel, SystemInvoke, UnboundedBatchingMailbox,
  UnboundedBatchingMailboxConfig, UserInvoke,
};
pub use runtime::{Dispatcher, Runnable, TokioDispatcher};

// --- Top-Level Library Information Functions ---

const VERSION_MAJOR: i32 = 0;
const VERSION_MINOR: i32 = 1;
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
///
/// # Examples
///
/// ```
/// let (major, minor, patch) = actor_mailbox::version();
/// println!("actor-mailbox version: {}.{}.{}", major, minor, patch);
/// ```
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}
