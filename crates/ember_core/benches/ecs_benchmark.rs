//! # ECS Performance Benchmark
//!
//! Measures the hot paths of the core:
//! - Entity creation and flush
//! - Two-component iteration
//! - Kill/flush churn with slot reuse
//!
//! Run with: `cargo bench --package ember_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ember_core::World;

#[derive(Clone, Copy, Default)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Default)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

/// Builds a flushed world where every entity has a position and velocity.
fn populated_world(count: usize) -> World {
    let mut world = World::new();
    for i in 0..count {
        let entity = world.create();
        let f = i as f32;
        world.add(entity, Position { x: f, y: f, z: f });
        world.add(entity, Velocity { x: 0.1, y: 0.2, z: 0.3 });
    }
    world.update();
    world
}

fn bench_create_and_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_and_flush");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let world = populated_world(count);
                black_box(world.alive_count())
            });
        });
    }

    group.finish();
}

fn bench_for_each2(c: &mut Criterion) {
    let mut group = c.benchmark_group("for_each2");

    for count in [10_000, 100_000] {
        let mut world = populated_world(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                world.for_each2(|_, position: &mut Position, velocity: &mut Velocity| {
                    position.x += velocity.x;
                    position.y += velocity.y;
                    position.z += velocity.z;
                });
            });
        });
    }

    group.finish();
}

fn bench_kill_churn(c: &mut Criterion) {
    c.bench_function("kill_and_recreate_1k_of_10k", |b| {
        let mut world = populated_world(10_000);
        b.iter(|| {
            let mut victims = Vec::with_capacity(1_000);
            world.for_each(|entity, _: &mut Position| {
                if victims.len() < 1_000 {
                    victims.push(entity);
                }
            });
            for entity in victims {
                world.kill(entity);
            }
            world.update();
            for _ in 0..1_000 {
                let entity = world.create();
                world.add(entity, Position::default());
            }
            world.update();
            black_box(world.slot_count())
        });
    });
}

criterion_group!(benches, bench_create_and_flush, bench_for_each2, bench_kill_churn);
criterion_main!(benches);
