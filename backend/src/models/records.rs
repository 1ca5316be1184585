//! Typed record shapes produced by the normalizer.
//!
//! Text fields are `None` when the source row did not carry a usable value;
//! numeric fields are always present and default to zero. The derived
//! `day_of_week` and `month` fields are filled from the record date when the
//! row does not state them explicitly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::kind::Dimension;
use super::measures::Measures;

/// Raw input row: field name to JSON value.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Field-accessor mapping shared by every record kind.
///
/// The aggregation engine is written against this trait only, so one tested
/// implementation serves sessions, leads, clients and sales alike.
pub trait AnalyticsRecord {
    /// Value of a categorical dimension, if the record has one.
    fn dimension(&self, dimension: Dimension) -> Option<&str>;

    /// Additive contribution of this record to a group.
    fn measures(&self) -> Measures;

    /// Calendar date the record is attributed to.
    fn date(&self) -> Option<NaiveDate>;

    /// Human-readable description used when a record is its own group.
    fn label(&self) -> String;
}

fn join_label(parts: &[Option<&str>]) -> String {
    let present: Vec<&str> = parts.iter().flatten().copied().collect();
    if present.is_empty() {
        "Unknown".to_string()
    } else {
        present.join(" • ")
    }
}

/// One class occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub class_name: Option<String>,
    pub trainer: Option<String>,
    pub location: Option<String>,
    pub day_of_week: Option<String>,
    pub time: Option<String>,
    pub date: Option<NaiveDate>,
    pub month: Option<String>,
    pub capacity: f64,
    pub checked_in: f64,
    pub booked: f64,
    pub late_cancelled: f64,
    pub revenue: f64,
    pub new_clients: f64,
    pub converted_clients: f64,
    pub retained_clients: f64,
}

impl AnalyticsRecord for SessionRecord {
    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Class => self.class_name.as_deref(),
            Dimension::Trainer => self.trainer.as_deref(),
            Dimension::Location => self.location.as_deref(),
            Dimension::Day => self.day_of_week.as_deref(),
            Dimension::Time => self.time.as_deref(),
            Dimension::Month => self.month.as_deref(),
            _ => None,
        }
    }

    fn measures(&self) -> Measures {
        Measures {
            capacity: self.capacity,
            revenue: self.revenue,
            bookings: self.booked,
            cancellations: self.late_cancelled,
            new_clients: self.new_clients,
            converted: self.converted_clients,
            retained: self.retained_clients,
            ..Measures::single(self.checked_in)
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn label(&self) -> String {
        let date = self.date.map(|d| d.format("%Y-%m-%d").to_string());
        join_label(&[
            self.class_name.as_deref(),
            self.trainer.as_deref(),
            date.as_deref().or(self.day_of_week.as_deref()),
            self.time.as_deref(),
        ])
    }
}

/// One entry of the sales funnel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub source: Option<String>,
    pub associate: Option<String>,
    pub center: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<NaiveDate>,
    pub day_of_week: Option<String>,
    pub month: Option<String>,
    pub ltv: f64,
    pub visits: f64,
    pub converted: bool,
    pub retained: bool,
}

impl AnalyticsRecord for LeadRecord {
    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Source => self.source.as_deref(),
            Dimension::Trainer => self.associate.as_deref(),
            Dimension::Location => self.center.as_deref(),
            Dimension::Stage => self.stage.as_deref(),
            Dimension::Day => self.day_of_week.as_deref(),
            Dimension::Month => self.month.as_deref(),
            _ => None,
        }
    }

    fn measures(&self) -> Measures {
        Measures {
            count: 1,
            new_clients: 1.0,
            converted: if self.converted { 1.0 } else { 0.0 },
            retained: if self.retained { 1.0 } else { 0.0 },
            ltv: self.ltv,
            visits: self.visits,
            ..Default::default()
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        self.created_at
    }

    fn label(&self) -> String {
        join_label(&[
            self.source.as_deref(),
            self.associate.as_deref(),
            self.stage.as_deref(),
        ])
    }
}

/// A new member tracked through conversion and retention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub member_id: Option<String>,
    pub name: Option<String>,
    pub trainer: Option<String>,
    pub first_visit_location: Option<String>,
    pub first_visit_date: Option<NaiveDate>,
    pub membership: Option<String>,
    pub day_of_week: Option<String>,
    pub month: Option<String>,
    pub is_new: bool,
    pub converted: bool,
    pub retained: bool,
    pub ltv: f64,
    pub visits_post_trial: f64,
    pub conversion_span_days: Option<f64>,
}

impl AnalyticsRecord for ClientRecord {
    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Trainer => self.trainer.as_deref(),
            Dimension::Location => self.first_visit_location.as_deref(),
            Dimension::Membership => self.membership.as_deref(),
            Dimension::Day => self.day_of_week.as_deref(),
            Dimension::Month => self.month.as_deref(),
            _ => None,
        }
    }

    fn measures(&self) -> Measures {
        let (span, samples) = match self.conversion_span_days {
            Some(days) => (days, 1),
            None => (0.0, 0),
        };
        Measures {
            count: 1,
            new_clients: if self.is_new { 1.0 } else { 0.0 },
            converted: if self.converted { 1.0 } else { 0.0 },
            retained: if self.retained { 1.0 } else { 0.0 },
            ltv: self.ltv,
            visits: self.visits_post_trial,
            conversion_span_days: span,
            conversion_span_samples: samples,
            ..Default::default()
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        self.first_visit_date
    }

    fn label(&self) -> String {
        join_label(&[
            self.name.as_deref().or(self.member_id.as_deref()),
            self.first_visit_location.as_deref(),
            self.membership.as_deref(),
        ])
    }
}

/// A payment line, possibly discounted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub product: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub seller: Option<String>,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub day_of_week: Option<String>,
    pub month: Option<String>,
    pub payment_value: f64,
    pub discount_amount: f64,
    pub discount_percentage: f64,
}

impl AnalyticsRecord for SaleRecord {
    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Product => self.product.as_deref(),
            Dimension::Category => self.category.as_deref(),
            Dimension::Location => self.location.as_deref(),
            Dimension::Trainer => self.seller.as_deref(),
            Dimension::PaymentMethod => self.payment_method.as_deref(),
            Dimension::Day => self.day_of_week.as_deref(),
            Dimension::Month => self.month.as_deref(),
            _ => None,
        }
    }

    fn measures(&self) -> Measures {
        Measures {
            count: 1,
            revenue: self.payment_value,
            discount: self.discount_amount,
            ..Default::default()
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        self.payment_date
    }

    fn label(&self) -> String {
        join_label(&[
            self.product.as_deref(),
            self.customer.as_deref(),
            self.location.as_deref(),
        ])
    }
}
