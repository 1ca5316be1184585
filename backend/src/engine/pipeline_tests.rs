use super::*;
use crate::engine::filter::RecordFilter;
use crate::engine::view::ViewSettings;
use crate::models::{LeadRecord, SessionRecord};
use std::num::NonZeroUsize;

fn session(class: &str, trainer: &str, capacity: f64, checked_in: f64) -> SessionRecord {
    SessionRecord {
        class_name: Some(class.to_string()),
        trainer: Some(trainer.to_string()),
        capacity,
        checked_in,
        ..Default::default()
    }
}

fn studio() -> Vec<SessionRecord> {
    vec![
        session("Yoga", "A", 10.0, 8.0),
        session("Yoga", "A", 10.0, 6.0),
        session("Pilates", "B", 20.0, 20.0),
    ]
}

fn sessions_config() -> ViewConfig {
    ViewConfig::new(RecordKind::Sessions, &ViewSettings::default())
}

fn labels(rows: &[GroupRow]) -> Vec<&str> {
    rows.iter().map(|r| r.label.as_str()).collect()
}

#[test]
fn test_group_by_class_sorted_by_fill_rate() {
    let records = studio();
    let config = sessions_config()
        .with_group_by(GroupBy::Class)
        .with_sort(Metric::FillRate, SortDirection::Desc);
    let view = run_view(&records, &config);

    assert_eq!(labels(&view.rows.items), vec!["Pilates", "Yoga"]);
    let yoga = &view.rows.items[1];
    assert_eq!(yoga.aggregate.count(), 2);
    assert_eq!(yoga.aggregate.totals.attendance, 14.0);
    assert_eq!(yoga.aggregate.totals.capacity, 20.0);
    assert!((yoga.metrics.fill_rate - 70.0).abs() < 1e-9);
    assert_eq!(yoga.members, vec![0, 1]);

    let pilates = &view.rows.items[0];
    assert_eq!(pilates.aggregate.count(), 1);
    assert!((pilates.metrics.fill_rate - 100.0).abs() < 1e-9);

    assert_eq!(view.group_count, 2);
    assert_eq!(view.record_count, 3);
    assert_eq!(view.totals.aggregate.totals.attendance, 34.0);
}

#[test]
fn test_none_grouping_labels_each_record() {
    let records = studio();
    let view = run_view(&records, &sessions_config().with_sort(SortField::Key, SortDirection::Asc));
    assert_eq!(view.group_count, 3);
    assert_eq!(view.rows.items[0].key.to_string(), "#0");
    assert_eq!(view.rows.items[0].label, "Yoga • A");
    let attendance: f64 = view.rows.items.iter().map(|r| r.aggregate.totals.attendance).sum();
    assert_eq!(attendance, 34.0);
}

#[test]
fn test_filter_applies_before_grouping() {
    let records = studio();
    let config = sessions_config()
        .with_group_by(GroupBy::Class)
        .with_filter(RecordFilter::default().with_trainers(["b"]));
    let view = run_view(&records, &config);
    assert_eq!(labels(&view.rows.items), vec!["Pilates"]);
    assert_eq!(view.rows.items[0].members, vec![2]);
    assert_eq!(view.record_count, 1);
}

#[test]
fn test_paged_view_keeps_extremes_over_all_groups() {
    let records: Vec<SessionRecord> = (0..12)
        .map(|i| session(&format!("C{:02}", i), "A", 10.0, i as f64))
        .collect();
    let config = sessions_config()
        .with_group_by(GroupBy::Class)
        .with_page(2, NonZeroUsize::new(5).unwrap())
        .with_extremes(1, 2, 2);
    let view = run_view(&records, &config);

    assert_eq!(view.rows.total_pages, 3);
    assert_eq!(labels(&view.rows.items), vec!["C06", "C05", "C04", "C03", "C02"]);
    assert_eq!(labels(&view.extremes.top), vec!["C11", "C10"]);
    assert_eq!(labels(&view.extremes.bottom), vec!["C00", "C01"]);
}

#[test]
fn test_min_sample_threshold_applies_to_extremes_only() {
    let records = studio();
    let config = sessions_config()
        .with_group_by(GroupBy::Class)
        .with_extremes(2, 5, 5);
    let view = run_view(&records, &config);
    assert_eq!(view.rows.items.len(), 2);
    assert_eq!(labels(&view.extremes.top), vec!["Yoga"]);
    assert_eq!(view.extremes.qualifying, 1);
}

#[test]
fn test_default_ungrouped_view_reports_extremes() {
    let records = studio();
    let config = sessions_config();
    assert_eq!(config.group_by, GroupBy::None);
    assert_eq!(config.min_sample, 3);

    let view = run_view(&records, &config);
    assert_eq!(view.extremes.qualifying, 3);
    assert_eq!(view.extremes.top[0].key.to_string(), "#2");
    assert!(!view.extremes.bottom.is_empty());
}

#[test]
fn test_lead_without_conversion_data_yields_zero_rate() {
    let leads = vec![LeadRecord {
        stage: Some("Trial Completed".to_string()),
        ..Default::default()
    }];
    let config = ViewConfig::new(RecordKind::Leads, &ViewSettings::default())
        .with_group_by(GroupBy::Stage);
    let view = run_view(&leads, &config);
    assert_eq!(view.rows.items.len(), 1);
    assert_eq!(view.rows.items[0].metrics.conversion_rate, 0.0);
}

#[test]
fn test_empty_input_produces_empty_view() {
    let records: Vec<SessionRecord> = vec![];
    let view = run_view(&records, &sessions_config().with_group_by(GroupBy::Class));
    assert!(view.rows.items.is_empty());
    assert_eq!(view.rows.total_pages, 1);
    assert!(view.extremes.top.is_empty());
    assert_eq!(view.record_count, 0);
    assert_eq!(view.totals.metrics.fill_rate, 0.0);
}

#[test]
fn test_repeated_runs_are_identical() {
    let records = studio();
    let config = sessions_config().with_group_by(GroupBy::ClassTrainer);
    let first = serde_json::to_string(&run_view(&records, &config)).unwrap();
    let second = serde_json::to_string(&run_view(&records, &config)).unwrap();
    assert_eq!(first, second);
}
