//! Aggregator: folds records sharing a key into running sums.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::grouping::{GroupBy, GroupKey};
use crate::models::{AnalyticsRecord, Dimension, Measures};

/// Totals of one group plus the distinct secondary dimension values seen in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    #[serde(flatten)]
    pub totals: Measures,
    pub trainers: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub classes: BTreeSet<String>,
}

impl Aggregate {
    /// The contribution of a single record.
    pub fn of<R: AnalyticsRecord>(record: &R) -> Self {
        let distinct = |dimension| {
            record
                .dimension(dimension)
                .map(|v| BTreeSet::from([v.to_string()]))
                .unwrap_or_default()
        };
        Self {
            totals: record.measures(),
            trainers: distinct(Dimension::Trainer),
            locations: distinct(Dimension::Location),
            classes: distinct(Dimension::Class),
        }
    }

    /// Merge two aggregates. Associative and commutative.
    pub fn combine(mut self, other: Aggregate) -> Aggregate {
        self.totals += other.totals;
        self.trainers.extend(other.trainers);
        self.locations.extend(other.locations);
        self.classes.extend(other.classes);
        self
    }

    pub fn count(&self) -> u64 {
        self.totals.count
    }
}

/// One bucket: its key, totals, and the input positions of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub key: GroupKey,
    pub aggregate: Aggregate,
    /// Positions in the input sequence, ascending.
    pub members: Vec<usize>,
}

/// Groups in first-seen order with a key index.
#[derive(Debug, Default)]
struct Grouping {
    groups: Vec<Group>,
    index: HashMap<GroupKey, usize>,
}

impl Grouping {
    fn with(mut self, key: GroupKey, position: usize, delta: Aggregate) -> Self {
        match self.index.get(&key) {
            Some(&slot) => {
                let group = &mut self.groups[slot];
                group.aggregate = std::mem::take(&mut group.aggregate).combine(delta);
                group.members.push(position);
            }
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(Group {
                    key,
                    aggregate: delta,
                    members: vec![position],
                });
            }
        }
        self
    }
}

/// Group `(position, record)` pairs in one pass.
///
/// Positions are carried through untouched, so a caller that filtered the
/// input still gets member indices into the original sequence. Groups come
/// back in the order their first member was seen.
pub fn group_records<'a, R, I>(records: I, group_by: GroupBy) -> Vec<Group>
where
    R: AnalyticsRecord + 'a,
    I: IntoIterator<Item = (usize, &'a R)>,
{
    records
        .into_iter()
        .fold(Grouping::default(), |acc, (position, record)| {
            acc.with(group_by.key_for(position, record), position, Aggregate::of(record))
        })
        .groups
}

/// Aggregate of an entire record sequence, used for totals rows.
pub fn total<'a, R, I>(records: I) -> Aggregate
where
    R: AnalyticsRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records
        .into_iter()
        .fold(Aggregate::default(), |acc, record| acc.combine(Aggregate::of(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionRecord;

    fn session(class: &str, trainer: &str, capacity: f64, checked_in: f64) -> SessionRecord {
        SessionRecord {
            class_name: Some(class.to_string()),
            trainer: Some(trainer.to_string()),
            capacity,
            checked_in,
            ..Default::default()
        }
    }

    fn sample() -> Vec<SessionRecord> {
        vec![
            session("Yoga", "A", 10.0, 8.0),
            session("Yoga", "A", 10.0, 6.0),
            session("Pilates", "B", 20.0, 20.0),
        ]
    }

    #[test]
    fn test_group_by_class_sums() {
        let records = sample();
        let groups = group_records(records.iter().enumerate(), GroupBy::Class);

        assert_eq!(groups.len(), 2);
        let yoga = &groups[0];
        assert_eq!(yoga.key.parts(), &["Yoga"]);
        assert_eq!(yoga.aggregate.count(), 2);
        assert_eq!(yoga.aggregate.totals.attendance, 14.0);
        assert_eq!(yoga.aggregate.totals.capacity, 20.0);
        assert_eq!(yoga.members, vec![0, 1]);
        assert_eq!(yoga.aggregate.trainers, BTreeSet::from(["A".to_string()]));

        let pilates = &groups[1];
        assert_eq!(pilates.aggregate.count(), 1);
        assert_eq!(pilates.aggregate.totals.attendance, 20.0);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = vec![
            session("Barre", "C", 10.0, 5.0),
            session("Yoga", "A", 10.0, 5.0),
            session("Barre", "C", 10.0, 5.0),
        ];
        let groups = group_records(records.iter().enumerate(), GroupBy::Class);
        let names: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(names, vec!["Barre", "Yoga"]);
    }

    #[test]
    fn test_filtered_input_keeps_original_positions() {
        let records = sample();
        let groups = group_records(
            records.iter().enumerate().filter(|(_, r)| r.checked_in < 10.0),
            GroupBy::Class,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 1]);
    }

    #[test]
    fn test_none_grouping_is_one_group_per_record() {
        let records = sample();
        let groups = group_records(records.iter().enumerate(), GroupBy::None);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.aggregate.count() == 1));
    }

    #[test]
    fn test_combine_is_commutative() {
        let records = sample();
        let a = Aggregate::of(&records[0]);
        let b = Aggregate::of(&records[2]);
        assert_eq!(a.clone().combine(b.clone()), b.combine(a));
    }

    #[test]
    fn test_total_over_empty_input() {
        let records: Vec<SessionRecord> = vec![];
        let totals = total(records.iter());
        assert_eq!(totals, Aggregate::default());
    }
}
