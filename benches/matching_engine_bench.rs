use criterion::{Criterion, black_box, criterion_group, criterion_main};

use matchbook::{Engine, EngineConfig, OrderType, SharedSink, Side};

fn setup_engine() -> Engine {
    let config = EngineConfig {
        order_id_ceiling: u32::MAX,
        ..EngineConfig::default()
    };
    Engine::new(config, Box::new(SharedSink::new()))
}

fn bench_booking(c: &mut Criterion) {
    let mut group = c.benchmark_group("booking");

    group.bench_function("insert_resting_limits", |b| {
        let mut engine = setup_engine();
        let mut price = 0i64;
        b.iter(|| {
            // Spread bids over a rolling price band so levels keep splicing.
            price = (price + 1) % 64;
            let id = engine
                .place_order("alice", 0, 10, 1_000 + price, Side::Buy, OrderType::Limit)
                .unwrap();
            black_box(id);
        });
    });

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");

    group.bench_function("cross_one_standing_order", |b| {
        let mut engine = setup_engine();
        b.iter(|| {
            engine
                .place_order("alice", 0, 10, 100, Side::Buy, OrderType::Limit)
                .unwrap();
            let id = engine
                .place_order("bob", 1, 10, 100, Side::Sell, OrderType::Limit)
                .unwrap();
            black_box(id);
        });
    });

    group.bench_function("sweep_ten_levels_market", |b| {
        let mut engine = setup_engine();
        b.iter(|| {
            for level in 0..10 {
                engine
                    .place_order("alice", 0, 5, 100 + level, Side::Sell, OrderType::Limit)
                    .unwrap();
            }
            let id = engine
                .place_order("bob", 1, 50, 0, Side::Buy, OrderType::Market)
                .unwrap();
            black_box(id);
        });
    });

    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");

    group.bench_function("realistic_mixed_operations", |b| {
        let mut engine = setup_engine();
        b.iter(|| {
            // 60% new resting orders
            for i in 0..6 {
                engine
                    .place_order("alice", 0, 10, 95 + i, Side::Buy, OrderType::Limit)
                    .unwrap();
            }
            // 20% cancellations
            for _ in 0..2 {
                let id = engine
                    .place_order("bob", 1, 10, 110, Side::Sell, OrderType::Limit)
                    .unwrap();
                engine.cancel_order(id).unwrap();
            }
            // 20% aggressive crosses
            for _ in 0..2 {
                let id = engine
                    .place_order("carol", 2, 10, 90, Side::Sell, OrderType::Ioc)
                    .unwrap();
                black_box(id);
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_booking, bench_matching, bench_mixed_workload);
criterion_main!(benches);
