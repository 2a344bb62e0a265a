//! Criterion benchmarks for the time-driven systems.
//!
//! Two benchmark groups:
//! - `growth`: refreshing a large field of crop tiles
//! - `production`: long offline catch-up over many fixed steps

use criterion::{Criterion, criterion_group, criterion_main};
use homestead_core::fixed::Fixed64;
use homestead_core::growth::{CropTile, refresh_tiles};
use homestead_core::id::ResourceId;
use homestead_core::production::{ProductionLedger, ResourceProduction};
use homestead_core::sim::{SimClock, Timestamp};
use homestead_core::test_utils::*;

/// A 100x100 field, every other tile seeded with wheat or corn.
fn planted_field() -> Vec<CropTile> {
    (0..10_000)
        .map(|i| {
            let mut tile = CropTile::empty();
            if i % 2 == 0 {
                let crop = if i % 4 == 0 { wheat() } else { corn() };
                let _ = tile.plant(crop, ts_secs(i as i64 % 60));
            }
            tile
        })
        .collect()
}

fn bench_growth(c: &mut Criterion) {
    let catalog = standard_catalog();
    let mut group = c.benchmark_group("growth");

    group.bench_function("refresh_10k_tiles", |b| {
        let mut tiles = planted_field();
        let mut secs = 0;
        b.iter(|| {
            secs += 1;
            refresh_tiles(tiles.iter_mut(), ts_secs(secs), &catalog)
        });
    });

    group.finish();
}

fn bench_production(c: &mut Criterion) {
    let mut group = c.benchmark_group("production");

    // One week offline at the default 10 s step: 60_480 steps.
    group.bench_function("week_offline_catch_up", |b| {
        b.iter(|| {
            let mut ledger = ProductionLedger::new();
            for r in 0..8 {
                let _ = ledger.track(ResourceProduction::new(
                    ResourceId(r),
                    Fixed64::from_num(r + 1) / 4,
                    1_000_000,
                ));
            }
            let mut clock = SimClock::new(Timestamp::EPOCH);
            let week_ms = 7 * 24 * 60 * 60 * 1_000;
            let steps = clock
                .advance(Timestamp::from_millis(week_ms), 10_000)
                .map_or(0, |a| a.steps_run);
            ledger.update_steps(steps, 10_000);
            ledger
        });
    });

    group.finish();
}

criterion_group!(benches, bench_growth, bench_production);
criterion_main!(benches);
