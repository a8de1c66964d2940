use actor_mailbox::{bounded_mailbox, unbounded_batching_mailbox, Mailbox};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

use std::sync::atomic::{AtomicUsize, Ordering};

// --- Benchmarking Constants ---
const MESSAGES: usize = 10_000;
const BOUNDED_CAPACITY: usize = 1024;

fn completion_counter() -> (Arc<AtomicUsize>, Arc<Notify>) {
  (Arc::new(AtomicUsize::new(0)), Arc::new(Notify::new()))
}

fn bench_bounded(c: &mut Criterion) {
  let rt = Runtime::new().expect("Failed to create Tokio runtime");
  let mut group = c.benchmark_group("bounded_mailbox");
  group.throughput(Throughput::Elements(MESSAGES as u64));

  for throughput in [1usize, 30, 300] {
    group.bench_with_input(BenchmarkId::from_parameter(throughput), &throughput, |b, &throughput| {
      b.to_async(&rt).iter(|| async move {
        let mailbox = bounded_mailbox::<usize, ()>(throughput, BOUNDED_CAPACITY).unwrap().produce();
        let (handled, done) = completion_counter();
        let (counter, notify) = (handled.clone(), done.clone());
        mailbox
          .register_handlers(
            Box::new(move |_| {
              if counter.fetch_add(1, Ordering::Relaxed) + 1 == MESSAGES {
                notify.notify_one();
              }
            }),
            Box::new(|_| {}),
          )
          .unwrap();

        for i in 0..MESSAGES {
          mailbox.post_user_message(i).await.unwrap();
        }
        done.notified().await;
      });
    });
  }
  group.finish();
}

fn bench_batching(c: &mut Criterion) {
  let rt = Runtime::new().expect("Failed to create Tokio runtime");
  let mut group = c.benchmark_group("unbounded_batching_mailbox");
  group.throughput(Throughput::Elements(MESSAGES as u64));

  for batch_size in [1usize, 16, 256] {
    group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, &batch_size| {
      b.to_async(&rt).iter(|| async move {
        let mailbox = unbounded_batching_mailbox::<usize, ()>(batch_size).unwrap().produce();
        let (handled, done) = completion_counter();
        let (counter, notify) = (handled.clone(), done.clone());
        mailbox
          .register_handlers(
            Box::new(move |batch: Vec<usize>| {
              if counter.fetch_add(batch.len(), Ordering::Relaxed) + batch.len() == MESSAGES {
                notify.notify_one();
              }
            }),
            Box::new(|_| {}),
          )
          .unwrap();

        for i in 0..MESSAGES {
          mailbox.post_user_message(i).await.unwrap();
        }
        done.notified().await;
      });
    });
  }
  group.finish();
}

criterion_group!(benches, bench_bounded, bench_batching);
criterion_main!(benches);
