//! The view pipeline: filter, group, aggregate, compute metrics, rank,
//! paginate and pick extremes in one pure pass.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::aggregate::{group_records, total, Aggregate, Group};
use super::extremes::{extract_extremes, Extremes};
use super::grouping::{GroupBy, GroupKey};
use super::metrics::{compute_metrics, GroupMetrics, Metric, MetricsConfig};
use super::pagination::{paginate, Page};
use super::ranking::{rank, Rankable, SortDirection, SortField};
use super::view::ViewConfig;
use crate::models::{AnalyticsRecord, RecordKind};

/// One grouped, measured row of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRow {
    pub key: GroupKey,
    pub label: String,
    pub aggregate: Aggregate,
    pub metrics: GroupMetrics,
    /// Input positions of the records in this group.
    pub members: Vec<usize>,
}

impl GroupRow {
    /// Measure `group`. Under the `none` strategy the label is the record's
    /// own description rather than its positional key.
    pub fn from_group<R: AnalyticsRecord>(
        group: Group,
        group_by: GroupBy,
        records: &[R],
        metrics: &MetricsConfig,
    ) -> Self {
        let label = match (group_by, group.members.first()) {
            (GroupBy::None, Some(&position)) => records
                .get(position)
                .map(|record| record.label())
                .unwrap_or_else(|| group.key.label()),
            _ => group.key.label(),
        };
        GroupRow {
            metrics: compute_metrics(&group.aggregate, metrics),
            key: group.key,
            label,
            aggregate: group.aggregate,
            members: group.members,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        metric.value(&self.aggregate, &self.metrics)
    }
}

impl Rankable for GroupRow {
    fn group_key(&self) -> &GroupKey {
        &self.key
    }

    fn metric_value(&self, metric: Metric) -> Option<f64> {
        self.value(metric)
    }

    fn sample_size(&self) -> u64 {
        self.aggregate.count()
    }
}

/// Aggregate and metrics over every record that passed the filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub aggregate: Aggregate,
    pub metrics: GroupMetrics,
}

/// Everything a grouped table needs to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedView {
    pub kind: RecordKind,
    pub group_by: GroupBy,
    pub sort: SortField,
    pub direction: SortDirection,
    pub rows: Page<GroupRow>,
    pub extremes: Extremes<GroupRow>,
    pub totals: Totals,
    /// Records that passed the filter.
    pub record_count: usize,
    pub group_count: usize,
}

/// Filter, group, measure and rank `records`, returning every group.
pub fn ranked_groups<R: AnalyticsRecord>(records: &[R], config: &ViewConfig) -> Vec<GroupRow> {
    let mut rows: Vec<GroupRow> = group_records(config.filter.apply(records), config.group_by)
        .into_iter()
        .map(|group| GroupRow::from_group(group, config.group_by, records, &config.metrics))
        .collect();
    rank(&mut rows, config.sort, config.direction);
    rows
}

/// Run the whole pipeline for one view.
pub fn run_view<R: AnalyticsRecord>(records: &[R], config: &ViewConfig) -> GroupedView {
    let started = Instant::now();

    let ranked = ranked_groups(records, config);
    let totals_aggregate = total(config.filter.apply(records).map(|(_, record)| record));
    let totals = Totals {
        metrics: compute_metrics(&totals_aggregate, &config.metrics),
        aggregate: totals_aggregate,
    };

    let view = GroupedView {
        kind: config.kind,
        group_by: config.group_by,
        sort: config.sort,
        direction: config.direction,
        rows: paginate(&ranked, config.page_size, config.page),
        extremes: extract_extremes(
            &ranked,
            config.effective_min_sample(),
            config.top_n,
            config.bottom_n,
        ),
        record_count: totals.aggregate.count() as usize,
        group_count: ranked.len(),
        totals,
    };

    log::debug!(
        "{} view grouped by {}: {} records -> {} groups in {:?}",
        config.kind,
        config.group_by,
        view.record_count,
        view.group_count,
        started.elapsed()
    );
    view
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
