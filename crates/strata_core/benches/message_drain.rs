//! Message queue drain throughput.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use strata_core::messaging::MessageQueue;
use strata_core::sync::FrameClock;

fn bench_drain(c: &mut Criterion) {
    let clock = FrameClock::new();
    let index = clock.update_index();

    c.bench_function("drain_4096_messages", |b| {
        b.iter_batched(
            || {
                let queue: MessageQueue<u64> = MessageQueue::new();
                let sender = queue.sender();
                for _ in 0..4096 {
                    sender.post(Box::new(|count, _| *count = count.wrapping_add(1)));
                }
                queue
            },
            |queue| {
                let mut target = 0u64;
                queue.drain_and_apply(&mut target, index);
                target
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_drain);
criterion_main!(benches);
