//! Ranker: stable ordering of groups by a metric or by key.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;
use super::grouping::GroupKey;
use super::metrics::Metric;

/// Anything that can be ordered by the ranker and filtered by sample size.
pub trait Rankable {
    fn group_key(&self) -> &GroupKey;

    /// Value of `metric`, `None` if the item carries no value for it.
    fn metric_value(&self, metric: Metric) -> Option<f64>;

    /// Number of underlying records.
    fn sample_size(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Metric(Metric),
    /// Lexicographic over key components, in component order.
    Key,
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Metric(metric) => write!(f, "{}", metric),
            SortField::Key => f.write_str("key"),
        }
    }
}

impl FromStr for SortField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "key" | "name" | "label" | "group" => Ok(SortField::Key),
            _ => s.parse::<Metric>().map(SortField::Metric),
        }
    }
}

impl From<Metric> for SortField {
    fn from(metric: Metric) -> Self {
        SortField::Metric(metric)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(EngineError::UnknownDirection(s.to_string())),
        }
    }
}

/// Ascending comparison of two items on `field`. Missing metric values
/// compare as 0.
pub fn compare_by<T: Rankable>(a: &T, b: &T, field: SortField) -> Ordering {
    match field {
        SortField::Key => a.group_key().cmp(b.group_key()),
        SortField::Metric(metric) => {
            let x = a.metric_value(metric).unwrap_or(0.0);
            let y = b.metric_value(metric).unwrap_or(0.0);
            x.total_cmp(&y)
        }
    }
}

/// Sort in place. The sort is stable, so equal items keep their input order
/// in either direction.
pub fn rank<T: Rankable>(items: &mut [T], field: SortField, direction: SortDirection) {
    match direction {
        SortDirection::Asc => items.sort_by(|a, b| compare_by(a, b, field)),
        SortDirection::Desc => items.sort_by(|a, b| compare_by(b, a, field)),
    }
}
