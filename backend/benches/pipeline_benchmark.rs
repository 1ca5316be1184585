use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use studio_analytics::engine::normalize::normalize_session;
use studio_analytics::engine::{
    build_hierarchy, parse_levels, run_view, GroupBy, Metric, MetricsConfig, RecordFilter,
    SortDirection, ViewConfig, ViewSettings,
};
use studio_analytics::models::{RawRecord, RecordKind, SessionRecord};

const CLASSES: [&str; 6] = ["Yoga", "Pilates", "Barre", "Strength", "Cycle", "Mat"];
const TRAINERS: [&str; 5] = ["Anisha", "Bea", "Chirag", "Dev", "Esha"];
const LOCATIONS: [&str; 3] = ["Kwality House", "Supreme HQ", "Kenkere House"];
const TIMES: [&str; 4] = ["7:00 AM", "08:30", "6:00 PM", "19:30"];

fn generate_rows(n: usize) -> Vec<RawRecord> {
    (0..n)
        .map(|i| {
            let capacity = 10 + (i % 15);
            let row = json!({
                "Class Name": CLASSES[i % CLASSES.len()],
                "Trainer": TRAINERS[(i / 3) % TRAINERS.len()],
                "Location": LOCATIONS[i % LOCATIONS.len()],
                "Date": format!("2024-{:02}-{:02}", 1 + (i / 28) % 12, 1 + i % 28),
                "Time": TIMES[i % TIMES.len()],
                "Capacity": capacity,
                "Checked In": (i * 7) % (capacity + 1),
                "Booked": (i * 5) % (capacity + 1),
                "Late Cancelled": i % 3,
                "Revenue": format!("₹{},{:03}", 1 + i % 9, (i * 37) % 1000),
            });
            row.as_object().cloned().unwrap_or_default()
        })
        .collect()
}

fn normalized(n: usize) -> Vec<SessionRecord> {
    generate_rows(n).iter().map(normalize_session).collect()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in [1_000, 10_000] {
        let rows = generate_rows(size);
        group.bench_with_input(BenchmarkId::new("sessions", size), &rows, |b, rows| {
            b.iter(|| {
                let records: Vec<SessionRecord> = rows.iter().map(normalize_session).collect();
                black_box(records)
            });
        });
    }

    group.finish();
}

fn bench_run_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_view");
    let settings = ViewSettings::default();

    for size in [1_000, 10_000] {
        let records = normalized(size);
        for group_by in [GroupBy::None, GroupBy::Class, GroupBy::ClassDayTimeLocationTrainer] {
            let config = ViewConfig::new(RecordKind::Sessions, &settings)
                .with_group_by(group_by)
                .with_sort(Metric::OverallScore, SortDirection::Desc);
            group.bench_with_input(
                BenchmarkId::new(group_by.as_str(), size),
                &records,
                |b, records| b.iter(|| black_box(run_view(black_box(records), &config))),
            );
        }
    }

    group.finish();
}

fn bench_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy");
    let records = normalized(10_000);
    let levels = parse_levels("day,dayTime,dayTimeClass,dayTimeClassTrainer").unwrap_or_default();
    let metrics = MetricsConfig::default();
    let filter = RecordFilter::default();

    group.bench_function("day_time_class_trainer", |b| {
        b.iter(|| {
            black_box(build_hierarchy(
                black_box(&records),
                &filter,
                &levels,
                &metrics,
                Metric::FillRate.into(),
                SortDirection::Desc,
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_run_view, bench_hierarchy);
criterion_main!(benches);
