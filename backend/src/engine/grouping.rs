//! Grouping key builder.
//!
//! A [`GroupBy`] strategy names the ordered list of dimensions a key is built
//! from. Keys keep their component values as a list, so parent/child relations
//! between levels are decided on components and never by re-splitting a joined
//! string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;
use crate::models::{AnalyticsRecord, Dimension};

/// Separator used by the display form of a key. Occurrences inside a
/// component are escaped with [`KEY_ESCAPE`].
pub const KEY_SEPARATOR: char = '|';
pub const KEY_ESCAPE: char = '\\';
/// Separator used in human-readable group labels.
pub const LABEL_SEPARATOR: &str = " • ";
/// Component value used when a record lacks a dimension.
pub const UNKNOWN: &str = "Unknown";

/// Stable identifier of one aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey {
    parts: Vec<String>,
}

impl GroupKey {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// Key of a record that forms its own group (the `none` strategy).
    pub fn for_record(index: usize) -> Self {
        Self {
            parts: vec![format!("#{}", index)],
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// True when `self` is a strict ancestor of `other`.
    pub fn is_prefix_of(&self, other: &GroupKey) -> bool {
        self.parts.len() < other.parts.len() && other.parts.starts_with(&self.parts)
    }

    /// Key made of the first `len` components.
    pub fn truncated(&self, len: usize) -> GroupKey {
        GroupKey {
            parts: self.parts[..len.min(self.parts.len())].to_vec(),
        }
    }

    pub fn label(&self) -> String {
        self.parts.join(LABEL_SEPARATOR)
    }

    /// Inverse of the display form: splits on unescaped separators.
    pub fn parse_display(s: &str) -> Self {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                KEY_ESCAPE => current.extend(chars.next()),
                KEY_SEPARATOR => parts.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        parts.push(current);
        Self { parts }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", KEY_SEPARATOR)?;
            }
            for c in part.chars() {
                if c == KEY_SEPARATOR || c == KEY_ESCAPE {
                    write!(f, "{}", KEY_ESCAPE)?;
                }
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

impl FromStr for GroupKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_display(s))
    }
}

/// Grouping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupBy {
    /// Every record is its own group.
    None,
    Class,
    Trainer,
    Location,
    Day,
    Time,
    Month,
    Source,
    Stage,
    Membership,
    Product,
    Category,
    PaymentMethod,
    ClassTrainer,
    ClassLocation,
    TrainerLocation,
    DayTime,
    ClassDay,
    ClassTime,
    SourceStage,
    DayTimeClass,
    DayTimeClassTrainer,
    ClassDayTime,
    ClassDayTimeLocation,
    ClassDayTimeLocationTrainer,
}

impl GroupBy {
    pub const ALL: [GroupBy; 25] = [
        GroupBy::None,
        GroupBy::Class,
        GroupBy::Trainer,
        GroupBy::Location,
        GroupBy::Day,
        GroupBy::Time,
        GroupBy::Month,
        GroupBy::Source,
        GroupBy::Stage,
        GroupBy::Membership,
        GroupBy::Product,
        GroupBy::Category,
        GroupBy::PaymentMethod,
        GroupBy::ClassTrainer,
        GroupBy::ClassLocation,
        GroupBy::TrainerLocation,
        GroupBy::DayTime,
        GroupBy::ClassDay,
        GroupBy::ClassTime,
        GroupBy::SourceStage,
        GroupBy::DayTimeClass,
        GroupBy::DayTimeClassTrainer,
        GroupBy::ClassDayTime,
        GroupBy::ClassDayTimeLocation,
        GroupBy::ClassDayTimeLocationTrainer,
    ];

    /// Dimensions joined into the key, in key order.
    pub fn dimensions(&self) -> &'static [Dimension] {
        use Dimension::*;
        match self {
            GroupBy::None => &[],
            GroupBy::Class => &[Class],
            GroupBy::Trainer => &[Trainer],
            GroupBy::Location => &[Location],
            GroupBy::Day => &[Day],
            GroupBy::Time => &[Time],
            GroupBy::Month => &[Month],
            GroupBy::Source => &[Source],
            GroupBy::Stage => &[Stage],
            GroupBy::Membership => &[Membership],
            GroupBy::Product => &[Product],
            GroupBy::Category => &[Category],
            GroupBy::PaymentMethod => &[PaymentMethod],
            GroupBy::ClassTrainer => &[Class, Trainer],
            GroupBy::ClassLocation => &[Class, Location],
            GroupBy::TrainerLocation => &[Trainer, Location],
            GroupBy::DayTime => &[Day, Time],
            GroupBy::ClassDay => &[Class, Day],
            GroupBy::ClassTime => &[Class, Time],
            GroupBy::SourceStage => &[Source, Stage],
            GroupBy::DayTimeClass => &[Day, Time, Class],
            GroupBy::DayTimeClassTrainer => &[Day, Time, Class, Trainer],
            GroupBy::ClassDayTime => &[Class, Day, Time],
            GroupBy::ClassDayTimeLocation => &[Class, Day, Time, Location],
            GroupBy::ClassDayTimeLocationTrainer => &[Class, Day, Time, Location, Trainer],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::None => "none",
            GroupBy::Class => "class",
            GroupBy::Trainer => "trainer",
            GroupBy::Location => "location",
            GroupBy::Day => "day",
            GroupBy::Time => "time",
            GroupBy::Month => "month",
            GroupBy::Source => "source",
            GroupBy::Stage => "stage",
            GroupBy::Membership => "membership",
            GroupBy::Product => "product",
            GroupBy::Category => "category",
            GroupBy::PaymentMethod => "paymentMethod",
            GroupBy::ClassTrainer => "classTrainer",
            GroupBy::ClassLocation => "classLocation",
            GroupBy::TrainerLocation => "trainerLocation",
            GroupBy::DayTime => "dayTime",
            GroupBy::ClassDay => "classDay",
            GroupBy::ClassTime => "classTime",
            GroupBy::SourceStage => "sourceStage",
            GroupBy::DayTimeClass => "dayTimeClass",
            GroupBy::DayTimeClassTrainer => "dayTimeClassTrainer",
            GroupBy::ClassDayTime => "classDayTime",
            GroupBy::ClassDayTimeLocation => "classDayTimeLocation",
            GroupBy::ClassDayTimeLocationTrainer => "classDayTimeLocationTrainer",
        }
    }

    /// Build the key of `record`, found at `index` in the input sequence.
    ///
    /// Missing dimension values resolve to [`UNKNOWN`] so the record still
    /// lands in a group.
    pub fn key_for<R: AnalyticsRecord>(&self, index: usize, record: &R) -> GroupKey {
        if *self == GroupBy::None {
            return GroupKey::for_record(index);
        }
        GroupKey::new(
            self.dimensions()
                .iter()
                .map(|d| record.dimension(*d).unwrap_or(UNKNOWN).to_string())
                .collect(),
        )
    }

    /// Whether every dimension of `self` leads the dimensions of `other`,
    /// and `other` has more of them.
    pub fn is_refined_by(&self, other: GroupBy) -> bool {
        let mine = self.dimensions();
        let theirs = other.dimensions();
        !mine.is_empty() && mine.len() < theirs.len() && theirs.starts_with(mine)
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = EngineError;

    /// Accepts the camelCase preset name, snake_case, or a `day+time+class`
    /// dimension list that matches a preset exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        if let Some(found) = GroupBy::ALL
            .iter()
            .find(|g| g.as_str().to_lowercase() == canonical)
        {
            return Ok(*found);
        }

        if s.contains('+') || s.contains(',') {
            let dims: Result<Vec<Dimension>, String> = s
                .split(['+', ','])
                .map(|part| part.parse::<Dimension>())
                .collect();
            if let Ok(dims) = dims {
                if let Some(found) = GroupBy::ALL.iter().find(|g| g.dimensions() == dims.as_slice()) {
                    return Ok(*found);
                }
            }
        }

        Err(EngineError::UnknownGrouping(s.to_string()))
    }
}
