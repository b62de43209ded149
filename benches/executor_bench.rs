//! Benchmarks for the queue executor.
//!
//! Benchmarks cover:
//! - Admission latch acquire/release
//! - Submission queue push/pop
//! - End-to-end submit and wait at several concurrency levels

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use queue_task_executor::core::{AdmissionLatch, QueueExecutor, TaskBody, TaskContext};
use queue_task_executor::infra::queue::{submission_queue, Pop};

// ============================================================================
// Building Blocks
// ============================================================================

fn bench_latch(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission_latch");

    for capacity in [1, 4, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            let latch = AdmissionLatch::new(capacity);
            b.iter(|| {
                while latch.acquire() {}
                for _ in 0..capacity {
                    latch.release();
                }
                black_box(latch.occupancy())
            });
        });
    }

    group.finish();
}

fn bench_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("submission_queue");
    let shutdown = AtomicBool::new(false);
    let tick = Duration::from_millis(1);

    for size in [100_u64, 1_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let capacity = usize::try_from(size).unwrap_or(usize::MAX);
            let (producer, consumer) = submission_queue(capacity);
            b.iter(|| {
                for i in 0..size {
                    let _ = producer.push(i, &shutdown, tick);
                }
                let mut sum = 0;
                while let Pop::Item(i) = consumer.try_pop() {
                    sum += i;
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// ============================================================================
// End-to-End
// ============================================================================

fn bench_submit_and_wait(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_and_wait");
    group.sample_size(20);
    let batch = 64_u64;
    group.throughput(Throughput::Elements(batch));

    for concurrency in [1, 4, 8] {
        let Ok(executor) = QueueExecutor::<u64>::builder()
            .worker_concurrency(concurrency)
            .queue_capacity(256)
            .dispatch_tick(Duration::from_millis(1))
            .thread_name("bench")
            .start()
        else {
            continue;
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &concurrency,
            |b, _| {
                b.iter(|| {
                    let handles: Vec<_> = (0..batch)
                        .map(|i| {
                            executor.submit(TaskBody::from_fn(move |_ctx: &TaskContext| Ok(i * 2)))
                        })
                        .collect();
                    let total: u64 = handles.iter().filter_map(|h| h.wait_for()).sum();
                    black_box(total)
                });
            },
        );

        executor.stop();
    }

    group.finish();
}

criterion_group!(building_block_benches, bench_latch, bench_queue_push_pop);
criterion_group!(executor_benches, bench_submit_and_wait);
criterion_main!(building_block_benches, executor_benches);
