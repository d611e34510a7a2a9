use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use game_net_metrics::{ConnectionId, NetworkMetrics, ObjectId};

const COUNTS: &[usize] = &[10, 100, 1000, 2000];

fn record_rpc(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_rpc");
    for &count in COUNTS {
        let id = BenchmarkId::new("record_rpc", count);
        group.bench_with_input(id, &count, |b, &count| {
            b.iter_batched_ref(
                NetworkMetrics::new,
                |metrics| {
                    for i in 0..count {
                        metrics.track_rpc_sent(
                            ConnectionId(i as u64 % 8),
                            ObjectId(i as u64 % 64),
                            black_box("UpdatePositionServerRpc"),
                            black_box("PlayerMovement"),
                            48,
                        );
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
}

fn dispatch_frame(c: &mut Criterion) {
    c.bench_function("dispatch_frame", |b| {
        let mut metrics = NetworkMetrics::new();
        let observer = std::sync::Arc::new(|collection: &game_net_metrics::MetricCollection| {
            black_box(collection.summary());
        });
        metrics.register_observer(&observer);

        b.iter(|| {
            for i in 0..1000 {
                metrics.track_object_spawn_sent(ConnectionId(1), ObjectId(i), 64);
            }
            metrics.dispatch_frame();
        });
    });
}

criterion_group! {
    benches,
    record_rpc,
    dispatch_frame,
}

criterion_main!(benches);
