//! Record kinds and the dimensions records can be grouped on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::error::EngineError;
use crate::engine::metrics::Metric;

/// The shape of rows held by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    /// Class occurrences with capacity and attendance.
    Sessions,
    /// Funnel entries (source, associate, stage, conversion).
    Leads,
    /// New members and their conversion/retention outcome.
    Clients,
    /// Payments, including discounted ones.
    Sales,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Sessions,
        RecordKind::Leads,
        RecordKind::Clients,
        RecordKind::Sales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sessions => "sessions",
            RecordKind::Leads => "leads",
            RecordKind::Clients => "clients",
            RecordKind::Sales => "sales",
        }
    }

    /// Metric a view falls back to when the requested sort key is unusable.
    pub fn default_metric(&self) -> Metric {
        match self {
            RecordKind::Sessions => Metric::FillRate,
            RecordKind::Leads | RecordKind::Clients => Metric::ConversionRate,
            RecordKind::Sales => Metric::TotalRevenue,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "session" | "sessions" | "class" | "classes" => Ok(RecordKind::Sessions),
            "lead" | "leads" => Ok(RecordKind::Leads),
            "client" | "clients" | "member" | "members" => Ok(RecordKind::Clients),
            "sale" | "sales" | "discount" | "discounts" => Ok(RecordKind::Sales),
            _ => Err(EngineError::UnknownRecordKind(s.to_string())),
        }
    }
}

/// A categorical field that grouping keys and filters are built from.
///
/// Dimensions are shared across record kinds: `Trainer` is a lead's associate
/// and a sale's seller, `Location` is a lead's center and a client's
/// first-visit location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
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
}

impl Dimension {
    pub const ALL: [Dimension; 12] = [
        Dimension::Class,
        Dimension::Trainer,
        Dimension::Location,
        Dimension::Day,
        Dimension::Time,
        Dimension::Month,
        Dimension::Source,
        Dimension::Stage,
        Dimension::Membership,
        Dimension::Product,
        Dimension::Category,
        Dimension::PaymentMethod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Class => "class",
            Dimension::Trainer => "trainer",
            Dimension::Location => "location",
            Dimension::Day => "day",
            Dimension::Time => "time",
            Dimension::Month => "month",
            Dimension::Source => "source",
            Dimension::Stage => "stage",
            Dimension::Membership => "membership",
            Dimension::Product => "product",
            Dimension::Category => "category",
            Dimension::PaymentMethod => "paymentMethod",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match canonical.as_str() {
            "class" | "classname" => Ok(Dimension::Class),
            "trainer" | "associate" | "seller" => Ok(Dimension::Trainer),
            "location" | "center" | "centre" => Ok(Dimension::Location),
            "day" | "dayofweek" => Ok(Dimension::Day),
            "time" => Ok(Dimension::Time),
            "month" => Ok(Dimension::Month),
            "source" => Ok(Dimension::Source),
            "stage" => Ok(Dimension::Stage),
            "membership" | "membershiptype" => Ok(Dimension::Membership),
            "product" => Ok(Dimension::Product),
            "category" => Ok(Dimension::Category),
            "paymentmethod" => Ok(Dimension::PaymentMethod),
            _ => Err(format!("unknown dimension '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_parsing_accepts_singular_and_plural() {
        assert_eq!("Session".parse::<RecordKind>().unwrap(), RecordKind::Sessions);
        assert_eq!("leads".parse::<RecordKind>().unwrap(), RecordKind::Leads);
        assert_eq!(" MEMBERS ".parse::<RecordKind>().unwrap(), RecordKind::Clients);
        assert_eq!("discounts".parse::<RecordKind>().unwrap(), RecordKind::Sales);
        assert!("payroll".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_default_metric_per_kind() {
        assert_eq!(RecordKind::Sessions.default_metric(), Metric::FillRate);
        assert_eq!(RecordKind::Sales.default_metric(), Metric::TotalRevenue);
    }

    #[test]
    fn test_dimension_parsing_ignores_case_and_punctuation() {
        assert_eq!("payment_method".parse::<Dimension>().unwrap(), Dimension::PaymentMethod);
        assert_eq!("Day of Week".parse::<Dimension>().unwrap(), Dimension::Day);
        assert_eq!("associate".parse::<Dimension>().unwrap(), Dimension::Trainer);
        assert!("weather".parse::<Dimension>().is_err());
    }
}
