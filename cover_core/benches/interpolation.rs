use std::time::Duration;

use cover_core::interpolate::{direction_for, estimate, progress_percent, reached, to_percent, travelled};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

// One full sampled travel: the per-tick work of the movement loop without sleeping.
fn sample_travel(initial: u8, target: u8, budget: Duration, tick: Duration) -> u8 {
    let dir = direction_for(initial, target);
    let mut elapsed = Duration::ZERO;
    let mut exact = f64::from(initial);
    while elapsed < budget && !reached(exact, target, dir) {
        elapsed += tick;
        exact = travelled(initial, target, dir, progress_percent(elapsed, budget));
    }
    to_percent(exact)
}

pub fn bench_interpolation(c: &mut Criterion) {
    let mut g = c.benchmark_group("interpolation");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p cover_core --bench interpolation
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }

    g.bench_function("estimate_step", |b| {
        b.iter(|| {
            let p = progress_percent(black_box(Duration::from_millis(4_300)), Duration::from_secs(12));
            black_box(estimate(black_box(20), 90, direction_for(20, 90), p))
        });
    });

    for &tick_ms in &[10u64, 100] {
        g.bench_function(format!("full_travel_tick_{tick_ms}ms"), |b| {
            b.iter(|| {
                black_box(sample_travel(
                    black_box(0),
                    black_box(100),
                    Duration::from_secs(30),
                    Duration::from_millis(tick_ms),
                ))
            });
        });
    }
    g.finish();
}

criterion_group!(interpolation, bench_interpolation);
criterion_main!(interpolation);
