#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use studio_analytics::config::AnalyticsConfig;
use studio_analytics::db::LocalRepository;
use studio_analytics::models::RawRecord;
use studio_analytics::services::AnalyticsService;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn row(value: Value) -> RawRecord {
    value.as_object().cloned().expect("fixture rows are JSON objects")
}

/// A week of class sessions as exported from the booking system, with the
/// header and value quirks seen in real sheets.
pub fn session_rows() -> Vec<RawRecord> {
    vec![
        row(json!({"Class Name": "Yoga", "Trainer": "A", "Location": "Kwality House",
            "Date": "2024-01-15", "Time": "7:00 AM", "Capacity": "10", "Checked In": "8",
            "Booked": 9, "Late Cancelled": 1, "Revenue": "₹4,000"})),
        row(json!({"Class Name": "Yoga", "Trainer": "A", "Location": "Kwality House",
            "Date": "2024-01-22", "Time": "07:00", "Capacity": 10, "Checked In": 6,
            "Booked": 8, "Late Cancelled": 2, "Revenue": "3,000"})),
        row(json!({"Class Name": "Pilates", "Trainer": "B", "Location": "Supreme HQ",
            "Date": "2024-01-16", "Time": "18:00", "Capacity": 20, "Checked In": 20,
            "Booked": 20, "Late Cancelled": 0, "Revenue": "₹10,000"})),
        row(json!({"Class Name": "Barre", "Trainer": "C", "Location": "Kwality House",
            "Date": "2024-01-17", "Time": "6:30 PM", "Capacity": 12, "Checked In": "n/a",
            "Booked": 5, "Late Cancelled": 0, "Revenue": null})),
        row(json!({"Class Name": "Pilates", "Trainer": "B", "Location": "Supreme HQ",
            "Date": "2024-02-13", "Time": "18:00", "Capacity": 20, "Checked In": 15,
            "Booked": 18, "Late Cancelled": 3, "Revenue": "₹7,500"})),
        row(json!({"Trainer": "A", "Capacity": 10, "Checked In": 4})),
    ]
}

pub fn lead_rows() -> Vec<RawRecord> {
    vec![
        row(json!({"source": "Instagram", "associate": "Priya", "stage": "Trial Completed",
            "conversionStatus": "Converted", "retentionStatus": "Retained", "ltv": "12,000"})),
        row(json!({"source": "Instagram", "associate": "Priya", "stage": "Trial Completed",
            "conversionStatus": "Not Converted", "ltv": "0"})),
        row(json!({"source": "Walk-in", "associate": "Rahul", "stage": "Trial Completed"})),
        row(json!({"source": "Walk-in", "associate": "Rahul", "stage": "Trial Booked",
            "conversionStatus": "Converted", "ltv": "₹8,500"})),
    ]
}

/// Configuration with lenient resolution and a small cache.
pub fn test_config(strict: bool) -> AnalyticsConfig {
    let mut config = AnalyticsConfig::default();
    config.engine.strict = strict;
    config.engine.cache_capacity = 8;
    config.engine.min_sample_size = 1;
    config
}

pub fn service(strict: bool) -> AnalyticsService {
    AnalyticsService::new(Arc::new(LocalRepository::new()), test_config(strict))
}
