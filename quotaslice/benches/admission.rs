use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quotaslice::{PeriodConfig, QuotaRegistry, SystemClock, UsagePeriod};
use std::hint::black_box;

fn bench_allowed_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("allowed_at");
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    for (label, config) in [
        (
            "aligned_day_by_hour",
            PeriodConfig::new("aligned", "DAY", i64::MAX)
                .with_granularity("HOUR")
                .clock_aligned(true),
        ),
        ("rolling_minute", PeriodConfig::new("rolling", "MINUTE", 1_000)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &config, |b, config| {
            let mut period = UsagePeriod::new(config.clone()).unwrap();
            let mut now = start;
            b.iter(|| {
                now += TimeDelta::milliseconds(1);
                black_box(period.allowed_at(black_box(now)))
            });
        });
    }

    group.finish();
}

fn bench_registry_check(c: &mut Criterion) {
    let mut registry: QuotaRegistry<SystemClock> = (0..10_000)
        .map(|i| {
            UsagePeriod::new(PeriodConfig::new(format!("subject-{i}"), "SECOND", 1_000_000)).unwrap()
        })
        .collect();
    let subjects: Vec<String> = (0..10_000).map(|i| format!("subject-{i}")).collect();
    let mut i = 0;

    c.bench_function("registry_check", |b| {
        b.iter(|| {
            i = (i + 1) % subjects.len();
            black_box(registry.check(black_box(&subjects[i])))
        });
    });
}

criterion_group!(benches, bench_allowed_at, bench_registry_check);
criterion_main!(benches);
