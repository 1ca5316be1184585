//! Record filters applied ahead of grouping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{AnalyticsRecord, Dimension};

/// Predicate set selected by the caller. An empty set or an unset bound
/// places no constraint.
///
/// Include-set values are stored lowercased; matching is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    pub classes: BTreeSet<String>,
    pub trainers: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub days: BTreeSet<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
}

fn lowered<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

impl RecordFilter {
    pub fn with_classes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, values: I) -> Self {
        self.classes = lowered(values);
        self
    }

    pub fn with_trainers<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, values: I) -> Self {
        self.trainers = lowered(values);
        self
    }

    pub fn with_locations<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, values: I) -> Self {
        self.locations = lowered(values);
        self
    }

    pub fn with_days<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, values: I) -> Self {
        self.days = lowered(values);
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.trainers.is_empty()
            && self.locations.is_empty()
            && self.days.is_empty()
            && self.from.is_none()
            && self.to.is_none()
            && self.search.is_none()
    }

    pub fn matches<R: AnalyticsRecord>(&self, record: &R) -> bool {
        let included = |set: &BTreeSet<String>, dimension: Dimension| {
            set.is_empty()
                || record
                    .dimension(dimension)
                    .is_some_and(|v| set.contains(&v.trim().to_lowercase()))
        };
        if !(included(&self.classes, Dimension::Class)
            && included(&self.trainers, Dimension::Trainer)
            && included(&self.locations, Dimension::Location)
            && included(&self.days, Dimension::Day))
        {
            return false;
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(date) = record.date() else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        match &self.search {
            None => true,
            Some(needle) => {
                record.label().to_lowercase().contains(needle.as_str())
                    || Dimension::ALL.iter().any(|d| {
                        record
                            .dimension(*d)
                            .is_some_and(|v| v.to_lowercase().contains(needle.as_str()))
                    })
            }
        }
    }

    /// `(position, record)` pairs that pass, positions into `records`.
    pub fn apply<'a, R: AnalyticsRecord>(
        &'a self,
        records: &'a [R],
    ) -> impl Iterator<Item = (usize, &'a R)> + 'a {
        records
            .iter()
            .enumerate()
            .filter(move |(_, record)| self.matches(*record))
    }
}
