//! Per-tick cost of the rule-driven update.
//!
//! Every entity that reacts to other entities scans the whole pool after
//! each axis step, so a tick is O(n^2) in live entities. These benchmarks
//! measure that growth with and without entity-vs-entity rules, plus the
//! cost of compiling rulesheets.
//!
//! Run with: `cargo bench --bench tick_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gridrule_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A walled arena `side` cells across holding `count` bouncing balls.
/// With `interacting`, balls also bounce off each other.
fn arena(side: usize, count: usize, interacting: bool) -> Game {
    let mut game = Game::new(GameConfig::default()).unwrap();
    let book = game.rulebook_mut();
    book.define(
        'o',
        Template {
            vx: 0.15,
            vy: 0.1,
            max_vx: 0.15,
            max_vy: 0.15,
            ..Default::default()
        },
    )
    .unwrap();

    let bounce = book.registry().collision_bits(&["block", "reverse"]);
    let drift: MovementFn = std::sync::Arc::new(|_: &mut Motion<'_>| {});
    book.on_hit('o', '#', HitRule::Bits(bounce)).unwrap();
    book.movement(
        'o',
        MoveRule::Axes {
            x: Some(MoveAction::Inline(drift.clone())),
            y: Some(MoveAction::Inline(drift)),
        },
    )
    .unwrap();
    if interacting {
        book.on_hit('o', 'o', HitRule::Bits(bounce)).unwrap();
    }

    let mut rows = Vec::with_capacity(side);
    for y in 0..side {
        let row: String = (0..side)
            .map(|x| if x == 0 || y == 0 || x == side - 1 || y == side - 1 { '#' } else { '.' })
            .collect();
        rows.push(row);
    }
    game.load_level(&LevelSource::lines(&rows.join("\n"))).unwrap();

    let inner = side - 2;
    for i in 0..count {
        let x = 1 + (i * 3) % inner;
        let y = 1 + (i * 7 / inner) % inner;
        game.spawn('o', x as f64, y as f64).unwrap();
    }
    game
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_tick_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_scaling");
    for count in [10usize, 50, 100, 250] {
        let mut game = arena(40, count, true);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let report = game.tick(&ControlState::IDLE, &mut NullSink);
                black_box(report.updated);
            });
        });
    }
    group.finish();
}

fn bench_tiles_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_tiles_only");
    for count in [10usize, 100, 250] {
        let mut game = arena(40, count, false);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let report = game.tick(&ControlState::IDLE, &mut NullSink);
                black_box(report.updated);
            });
        });
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut game = arena(10, 0, true);
    c.bench_function("compile_dirty_sheet", |b| {
        b.iter(|| {
            let book = game.rulebook_mut();
            let bounce = book.registry().collision_bits(&["block", "reverse"]);
            book.on_hit('o', '#', HitRule::Bits(bounce)).unwrap();
            black_box(book.compile_all());
        });
    });
}

fn bench_state_hash(c: &mut Criterion) {
    let game = arena(40, 250, true);
    c.bench_function("state_hash_250", |b| {
        b.iter(|| black_box(game.state_hash()));
    });
}

criterion_group!(
    benches,
    bench_tick_scaling,
    bench_tiles_only,
    bench_compile,
    bench_state_hash,
);
criterion_main!(benches);
