//! Drill-down payloads for a single group or record.

use serde::{Deserialize, Serialize};

use super::aggregate::{group_records, Aggregate};
use super::grouping::GroupKey;
use super::metrics::{compute_metrics, GroupMetrics, MetricsConfig};
use super::pipeline::GroupRow;
use super::view::ViewConfig;
use crate::models::AnalyticsRecord;

/// A group's label, measures and constituent records, handed to a detail
/// view as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDown<T> {
    pub key: GroupKey,
    pub label: String,
    pub aggregate: Aggregate,
    pub metrics: GroupMetrics,
    pub members: Vec<usize>,
    /// Member records in input order.
    pub records: Vec<T>,
}

impl<T> DrillDown<T> {
    /// Swap the attached records for another representation of the same
    /// members, such as the raw rows they were normalized from.
    pub fn with_records<U>(self, records: Vec<U>) -> DrillDown<U> {
        DrillDown {
            key: self.key,
            label: self.label,
            aggregate: self.aggregate,
            metrics: self.metrics,
            members: self.members,
            records,
        }
    }
}

/// Payload of the group whose key displays as `key` under `config`'s
/// grouping and filter. Under the `none` strategy keys are `#<index>`.
pub fn drill_down<R>(records: &[R], config: &ViewConfig, key: &str) -> Option<DrillDown<R>>
where
    R: AnalyticsRecord + Clone,
{
    let wanted = GroupKey::parse_display(key);
    let group = group_records(config.filter.apply(records), config.group_by)
        .into_iter()
        .find(|group| group.key == wanted)?;
    let row = GroupRow::from_group(group, config.group_by, records, &config.metrics);
    let members: Vec<R> = row
        .members
        .iter()
        .filter_map(|&position| records.get(position).cloned())
        .collect();
    Some(DrillDown {
        key: row.key,
        label: row.label,
        aggregate: row.aggregate,
        metrics: row.metrics,
        members: row.members,
        records: members,
    })
}

/// Payload for the single record at `index`.
pub fn record_detail<R>(records: &[R], index: usize, metrics: &MetricsConfig) -> Option<DrillDown<R>>
where
    R: AnalyticsRecord + Clone,
{
    let record = records.get(index)?;
    let aggregate = Aggregate::of(record);
    Some(DrillDown {
        key: GroupKey::for_record(index),
        label: record.label(),
        metrics: compute_metrics(&aggregate, metrics),
        aggregate,
        members: vec![index],
        records: vec![record.clone()],
    })
}
