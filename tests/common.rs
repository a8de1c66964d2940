// tests/common.rs
#![allow(dead_code)] // Not every test binary uses every helper

use parking_lot::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(100);
pub const LONG_TIMEOUT: Duration = Duration::from_secs(5);

// Use std::sync::Once for one-time initialization
static TRACING_INIT: Once = Once::new();

// Setup function to initialize tracing
pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "actor_mailbox=debug,warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_max_level(tracing::Level::TRACE)
      .with_env_filter(env_filter)
      .with_target(true)
      .with_line_number(true)
      .with_span_events(FmtSpan::CLOSE)
      .with_test_writer()
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

/// Collects values delivered to handlers, in delivery order.
#[derive(Debug)]
pub struct Recorder<T> {
  items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
  fn clone(&self) -> Self {
    Self {
      items: self.items.clone(),
    }
  }
}

impl<T: Clone> Recorder<T> {
  pub fn new() -> Self {
    Self {
      items: Arc::new(Mutex::new(Vec::new())),
    }
  }

  pub fn push(&self, item: T) {
    self.items.lock().push(item);
  }

  pub fn len(&self) -> usize {
    self.items.lock().len()
  }

  pub fn snapshot(&self) -> Vec<T> {
    self.items.lock().clone()
  }

  /// Waits until at least `n` items were recorded. Returns `false` on timeout.
  pub async fn wait_for_len(&self, n: usize, timeout: Duration) -> bool {
    wait_until(timeout, || self.len() >= n).await
  }
}

/// Polls `condition` every millisecond until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
  let deadline = tokio::time::Instant::now() + timeout;
  loop {
    if condition() {
      return true;
    }
    if tokio::time::Instant::now() >= deadline {
      return false;
    }
    tokio::time::sleep(Duration::from_millis(1)).await;
  }
}

/// Tracks how many handler invocations overlap in time.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
  active: Arc<AtomicUsize>,
  max_seen: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
  pub fn enter(&self) {
    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_seen.fetch_max(now, Ordering::SeqCst);
  }

  pub fn exit(&self) {
    self.active.fetch_sub(1, Ordering::SeqCst);
  }

  pub fn max_concurrency(&self) -> usize {
    self.max_seen.load(Ordering::SeqCst)
  }
}
