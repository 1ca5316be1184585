//! Hierarchical grouping.
//!
//! Every level is an independent grouping pass over the same filtered
//! records. A record therefore contributes to one node per level. Children are attached
//! to the parent whose key the previous level computes for their first
//! member, and that parent key is kept on the node.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::aggregate::{group_records, Aggregate};
use super::error::{EngineError, EngineResult};
use super::filter::RecordFilter;
use super::grouping::{GroupBy, GroupKey};
use super::metrics::{GroupMetrics, MetricsConfig};
use super::pipeline::GroupRow;
use super::ranking::{rank, SortDirection, SortField};
use crate::models::AnalyticsRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub key: GroupKey,
    pub parent: Option<GroupKey>,
    pub level: usize,
    pub group_by: GroupBy,
    pub label: String,
    pub aggregate: Aggregate,
    pub metrics: GroupMetrics,
    pub members: Vec<usize>,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::size).sum::<usize>()
    }
}

/// Check that each level strictly extends the one before it. `none` may only
/// appear as the last level, where it yields one leaf per record.
pub fn validate_levels(levels: &[GroupBy]) -> EngineResult<()> {
    if levels.is_empty() {
        return Err(EngineError::InvalidHierarchy(
            "at least one level is required".to_string(),
        ));
    }
    for (depth, pair) in levels.windows(2).enumerate() {
        let (parent, child) = (pair[0], pair[1]);
        let extends = match (parent, child) {
            (GroupBy::None, _) => false,
            (_, GroupBy::None) => true,
            _ => parent.is_refined_by(child),
        };
        if !extends {
            return Err(EngineError::InvalidHierarchy(format!(
                "level {} ({}) does not extend level {} ({})",
                depth + 1,
                child,
                depth,
                parent
            )));
        }
    }
    Ok(())
}

/// Parse a comma-separated level list such as `day,dayTime,dayTimeClass`.
pub fn parse_levels(levels: &str) -> EngineResult<Vec<GroupBy>> {
    let levels: Vec<GroupBy> = levels
        .split(',')
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .map(str::parse)
        .collect::<EngineResult<_>>()?;
    validate_levels(&levels)?;
    Ok(levels)
}

/// Build the tree for `levels` over the records `filter` keeps, ranking
/// siblings by `sort`.
pub fn build_hierarchy<R: AnalyticsRecord>(
    records: &[R],
    filter: &RecordFilter,
    levels: &[GroupBy],
    metrics: &MetricsConfig,
    sort: SortField,
    direction: SortDirection,
) -> EngineResult<Vec<HierarchyNode>> {
    validate_levels(levels)?;

    let mut pending: HashMap<GroupKey, Vec<HierarchyNode>> = HashMap::new();
    let mut roots = Vec::new();

    for (depth, &group_by) in levels.iter().enumerate().rev() {
        let mut rows: Vec<GroupRow> = group_records(filter.apply(records), group_by)
            .into_iter()
            .map(|group| GroupRow::from_group(group, group_by, records, metrics))
            .collect();
        rank(&mut rows, sort, direction);

        let parent_level = depth.checked_sub(1).map(|d| levels[d]);
        let mut by_parent: HashMap<GroupKey, Vec<HierarchyNode>> = HashMap::new();
        for row in rows {
            let parent = parent_level.and_then(|level| {
                row.members
                    .first()
                    .map(|&position| level.key_for(position, &records[position]))
            });
            let node = HierarchyNode {
                children: pending.remove(&row.key).unwrap_or_default(),
                parent: parent.clone(),
                level: depth,
                group_by,
                key: row.key,
                label: row.label,
                aggregate: row.aggregate,
                metrics: row.metrics,
                members: row.members,
            };
            match parent {
                Some(parent) => by_parent.entry(parent).or_default().push(node),
                None => roots.push(node),
            }
        }
        pending = by_parent;
    }

    log::debug!(
        "Built {}-level hierarchy with {} roots",
        levels.len(),
        roots.len()
    );
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::metrics::Metric;
    use crate::models::SessionRecord;

    fn session(day: &str, time: &str, class: &str, checked_in: f64) -> SessionRecord {
        SessionRecord {
            day_of_week: Some(day.to_string()),
            time: Some(time.to_string()),
            class_name: Some(class.to_string()),
            capacity: 10.0,
            checked_in,
            ..Default::default()
        }
    }

    fn week() -> Vec<SessionRecord> {
        vec![
            session("Monday", "07:00", "Yoga", 8.0),
            session("Monday", "07:00", "Barre", 4.0),
            session("Monday", "18:00", "Yoga", 9.0),
            session("Tuesday", "07:00", "Yoga", 5.0),
        ]
    }

    fn build(levels: &[GroupBy]) -> EngineResult<Vec<HierarchyNode>> {
        build_hierarchy(
            &week(),
            &RecordFilter::default(),
            levels,
            &MetricsConfig::default(),
            SortField::Metric(Metric::TotalAttendance),
            SortDirection::Desc,
        )
    }

    #[test]
    fn test_tree_links_by_parent_key() {
        let roots = build(&[GroupBy::Day, GroupBy::DayTime, GroupBy::DayTimeClass]).unwrap();
        assert_eq!(roots.len(), 2);

        let monday = &roots[0];
        assert_eq!(monday.key.to_string(), "Monday");
        assert_eq!(monday.aggregate.count(), 3);
        assert_eq!(monday.parent, None);
        assert_eq!(monday.children.len(), 2);

        let morning = &monday.children[0];
        assert_eq!(morning.key.to_string(), "Monday|07:00");
        assert_eq!(morning.parent.as_ref(), Some(&monday.key));
        assert_eq!(morning.children.len(), 2);
        for leaf in &morning.children {
            assert!(morning.key.is_prefix_of(&leaf.key));
            assert_eq!(leaf.level, 2);
        }
    }

    #[test]
    fn test_records_appear_once_per_level() {
        let roots = build(&[GroupBy::Day, GroupBy::DayTime]).unwrap();
        let top: usize = roots.iter().map(|n| n.aggregate.count() as usize).sum();
        let second: usize = roots
            .iter()
            .flat_map(|n| &n.children)
            .map(|n| n.aggregate.count() as usize)
            .sum();
        assert_eq!(top, 4);
        assert_eq!(second, 4);
    }

    #[test]
    fn test_none_as_leaf_level_gives_individual_sessions() {
        let roots = build(&[GroupBy::DayTime, GroupBy::None]).unwrap();
        let leaves: usize = roots.iter().map(|n| n.children.len()).sum();
        assert_eq!(leaves, 4);
        let monday_morning = roots
            .iter()
            .find(|n| n.key.to_string() == "Monday|07:00")
            .unwrap();
        assert_eq!(monday_morning.size(), 3);
        assert_eq!(monday_morning.children[0].label, "Yoga • Monday • 07:00");
    }

    #[test]
    fn test_filter_restricts_every_level() {
        let records = week();
        let roots = build_hierarchy(
            &records,
            &RecordFilter::default().with_classes(["Barre"]),
            &[GroupBy::Day, GroupBy::DayTime],
            &MetricsConfig::default(),
            SortField::Key,
            SortDirection::Asc,
        )
        .unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].key.to_string(), "Monday");
        assert_eq!(roots[0].members, vec![1]);
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].members, vec![1]);
    }

    #[test]
    fn test_separator_inside_values_does_not_break_linkage() {
        let records = vec![session("Mon|day", "07:00", "Yoga", 8.0)];
        let roots = build_hierarchy(
            &records,
            &RecordFilter::default(),
            &[GroupBy::Day, GroupBy::DayTime],
            &MetricsConfig::default(),
            SortField::Key,
            SortDirection::Asc,
        )
        .unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 1);
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!(
            parse_levels("day, dayTime,dayTimeClass").unwrap(),
            vec![GroupBy::Day, GroupBy::DayTime, GroupBy::DayTimeClass]
        );
        assert!(matches!(
            parse_levels("day,weather"),
            Err(EngineError::UnknownGrouping(_))
        ));
        assert!(matches!(parse_levels(""), Err(EngineError::InvalidHierarchy(_))));
    }

    #[test]
    fn test_invalid_level_chains() {
        assert!(matches!(build(&[]), Err(EngineError::InvalidHierarchy(_))));
        assert!(matches!(
            build(&[GroupBy::Class, GroupBy::DayTime]),
            Err(EngineError::InvalidHierarchy(_))
        ));
        assert!(matches!(
            build(&[GroupBy::None, GroupBy::Day]),
            Err(EngineError::InvalidHierarchy(_))
        ));
        assert!(matches!(
            build(&[GroupBy::Day, GroupBy::Day]),
            Err(EngineError::InvalidHierarchy(_))
        ));
    }
}
