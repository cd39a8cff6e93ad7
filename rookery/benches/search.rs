/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use rookery::*;

fn search_benchmark(c: &mut Criterion) {
    let kiwipete = Position::from_fen(FEN_KIWIPETE).unwrap();

    // A fresh table each iteration, so every search starts cold
    c.bench_function("Kiwipete search depth 3", |b| {
        b.iter_batched(
            || {
                let config = EngineConfig {
                    hash_mb: 4,
                    ..Default::default()
                };
                (Engine::new(config), kiwipete)
            },
            |(mut engine, mut position)| black_box(engine.search(&mut position, black_box(3))),
            BatchSize::LargeInput,
        );
    });
}

fn evaluate_benchmark(c: &mut Criterion) {
    let kiwipete = Position::from_fen(FEN_KIWIPETE).unwrap();
    c.bench_function("Kiwipete evaluate", |b| {
        b.iter(|| black_box(evaluate(black_box(&kiwipete))));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10).measurement_time(Duration::from_secs(30));
    targets = search_benchmark, evaluate_benchmark
}
criterion_main!(benches);
