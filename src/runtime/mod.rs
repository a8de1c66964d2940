// src/runtime/mod.rs

//! Execution primitives mailboxes are built on: backing queues and drain dispatch.

pub mod dispatcher;
pub(crate) mod queue;

pub use dispatcher::{Dispatcher, Runnable, TokioDispatcher};
pub(crate) use queue::MessageQueue;
