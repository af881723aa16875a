//! Benchmark: follower stepping and token duplication.
//!
//! Run with: `cargo bench -p filterdeck-core --bench follower_bench`

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use filterdeck_core::animation::{Follower, FollowerConfig};
use filterdeck_core::geometry::Point;
use filterdeck_core::token::{Token, TokenIdAllocator, TokenKind};

fn bench_follower_step(c: &mut Criterion) {
    c.bench_function("follower_step_60_ticks", |b| {
        b.iter(|| {
            let mut f = Follower::new(Point::ZERO, FollowerConfig::default());
            f.set_target(Point::new(640.0, 360.0));
            for _ in 0..60 {
                f.step();
            }
            black_box(f.position())
        });
    });
}

fn bench_duplicate_container(c: &mut Criterion) {
    let mut ids = TokenIdAllocator::new();
    let kind = TokenKind::new("Joker", "Blueprint");
    let children: Vec<Token> = (0..64)
        .map(|_| Token::plain(ids.allocate().expect("id"), kind.clone()))
        .collect();
    let group = Token::container(
        ids.allocate().expect("id"),
        TokenKind::new("Group", "Banned"),
        children,
    );

    c.bench_function("duplicate_container_64", |b| {
        b.iter(|| {
            let mut ids = ids.clone();
            black_box(group.duplicate(&mut ids).expect("duplicate"))
        });
    });
}

criterion_group!(benches, bench_follower_step, bench_duplicate_container);
criterion_main!(benches);
