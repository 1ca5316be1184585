//! Metric calculator: derived rates from aggregated sums.
//!
//! Every division is guarded; a zero denominator yields `0`. Rates are
//! percentages and are not clamped, so a group whose bookings exceed its
//! capacity can report a booking rate above 100.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::aggregate::Aggregate;
use super::error::EngineError;

/// Denominator used by conversion and retention rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateBasis {
    /// New clients/members in the group.
    #[default]
    NewClients,
    /// Checked-in attendance.
    Attendance,
    /// Number of records in the group.
    Records,
}

impl RateBasis {
    fn denominator(&self, aggregate: &Aggregate) -> f64 {
        match self {
            RateBasis::NewClients => aggregate.totals.new_clients,
            RateBasis::Attendance => aggregate.totals.attendance,
            RateBasis::Records => aggregate.totals.count as f64,
        }
    }
}

impl FromStr for RateBasis {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match canonical.as_str() {
            "newclients" | "newmembers" | "new" => Ok(RateBasis::NewClients),
            "attendance" | "checkedin" => Ok(RateBasis::Attendance),
            "records" | "count" | "leads" | "total" => Ok(RateBasis::Records),
            _ => Err(EngineError::UnknownRateBasis(s.to_string())),
        }
    }
}

/// Weights of the composite performance score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub fill_rate: f64,
    pub revenue: f64,
    pub show_up: f64,
    pub consistency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            fill_rate: 0.3,
            revenue: 0.25,
            show_up: 0.25,
            consistency: 0.2,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.fill_rate + self.revenue + self.show_up + self.consistency
    }

    pub fn validate(&self) -> Result<(), String> {
        let parts = [self.fill_rate, self.revenue, self.show_up, self.consistency];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("score weights must be finite and non-negative".to_string());
        }
        if (self.sum() - 1.0).abs() > 1e-6 {
            return Err(format!("score weights must sum to 1.0, got {}", self.sum()));
        }
        Ok(())
    }
}

/// Tunables of the metric calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    pub weights: ScoreWeights,
    /// Average revenue per record that earns a full revenue score.
    pub revenue_ceiling: f64,
    pub conversion_basis: RateBasis,
    pub retention_basis: RateBasis,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            revenue_ceiling: 5000.0,
            conversion_basis: RateBasis::NewClients,
            retention_basis: RateBasis::NewClients,
        }
    }
}

/// Derived metrics of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetrics {
    pub fill_rate: f64,
    pub booking_rate: f64,
    pub cancellation_rate: f64,
    pub show_up_rate: f64,
    pub class_average: f64,
    pub avg_revenue: f64,
    pub revenue_per_attendee: f64,
    pub conversion_rate: f64,
    pub retention_rate: f64,
    pub avg_ltv: f64,
    pub avg_visits: f64,
    pub avg_discount: f64,
    pub avg_conversion_span: Option<f64>,
    pub revenue_score: f64,
    pub consistency: f64,
    pub overall_score: f64,
}

/// `numerator / denominator`, or `0` when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// [`ratio`] expressed as a percentage.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    ratio(numerator, denominator) * 100.0
}

/// Consistency of per-record attendance: `max(0, 100 - stdDev/mean * 100)`.
///
/// Uses the population variance from running sums; a zero mean scores 0.
pub fn consistency_score(aggregate: &Aggregate) -> f64 {
    let t = &aggregate.totals;
    let n = t.count as f64;
    let mean = ratio(t.attendance, n);
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = (t.attendance_sq / n - mean * mean).max(0.0);
    (100.0 - variance.sqrt() / mean * 100.0).max(0.0)
}

/// Compute every metric of a group.
pub fn compute_metrics(aggregate: &Aggregate, config: &MetricsConfig) -> GroupMetrics {
    let t = &aggregate.totals;
    let count = t.count as f64;

    let fill_rate = percentage(t.attendance, t.capacity);
    let show_up_rate = percentage(t.attendance, t.bookings);
    let avg_revenue = ratio(t.revenue, count);
    let revenue_score = if config.revenue_ceiling > 0.0 {
        (avg_revenue / config.revenue_ceiling * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let consistency = consistency_score(aggregate);
    let w = &config.weights;
    let overall_score = w.fill_rate * fill_rate.min(100.0)
        + w.revenue * revenue_score
        + w.show_up * show_up_rate.min(100.0)
        + w.consistency * consistency;

    GroupMetrics {
        fill_rate,
        booking_rate: percentage(t.bookings, t.capacity),
        cancellation_rate: percentage(t.cancellations, t.bookings),
        show_up_rate,
        class_average: ratio(t.attendance, count),
        avg_revenue,
        revenue_per_attendee: ratio(t.revenue, t.attendance),
        conversion_rate: percentage(t.converted, config.conversion_basis.denominator(aggregate)),
        retention_rate: percentage(t.retained, config.retention_basis.denominator(aggregate)),
        avg_ltv: ratio(t.ltv, count),
        avg_visits: ratio(t.visits, count),
        avg_discount: ratio(t.discount, count),
        avg_conversion_span: (t.conversion_span_samples > 0)
            .then(|| t.conversion_span_days / t.conversion_span_samples as f64),
        revenue_score,
        consistency,
        overall_score,
    }
}

/// A sortable quantity of a group: a raw total or a derived metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Count,
    TotalAttendance,
    TotalCapacity,
    TotalRevenue,
    TotalBookings,
    TotalCancellations,
    NewClients,
    Converted,
    Retained,
    TotalLtv,
    TotalDiscount,
    FillRate,
    BookingRate,
    CancellationRate,
    ShowUpRate,
    ClassAverage,
    AvgRevenue,
    RevenuePerAttendee,
    ConversionRate,
    RetentionRate,
    AvgLtv,
    AvgVisits,
    AvgDiscount,
    AvgConversionSpan,
    RevenueScore,
    Consistency,
    OverallScore,
}

impl Metric {
    pub const ALL: [Metric; 27] = [
        Metric::Count,
        Metric::TotalAttendance,
        Metric::TotalCapacity,
        Metric::TotalRevenue,
        Metric::TotalBookings,
        Metric::TotalCancellations,
        Metric::NewClients,
        Metric::Converted,
        Metric::Retained,
        Metric::TotalLtv,
        Metric::TotalDiscount,
        Metric::FillRate,
        Metric::BookingRate,
        Metric::CancellationRate,
        Metric::ShowUpRate,
        Metric::ClassAverage,
        Metric::AvgRevenue,
        Metric::RevenuePerAttendee,
        Metric::ConversionRate,
        Metric::RetentionRate,
        Metric::AvgLtv,
        Metric::AvgVisits,
        Metric::AvgDiscount,
        Metric::AvgConversionSpan,
        Metric::RevenueScore,
        Metric::Consistency,
        Metric::OverallScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::TotalAttendance => "totalAttendance",
            Metric::TotalCapacity => "totalCapacity",
            Metric::TotalRevenue => "totalRevenue",
            Metric::TotalBookings => "totalBookings",
            Metric::TotalCancellations => "totalCancellations",
            Metric::NewClients => "newClients",
            Metric::Converted => "converted",
            Metric::Retained => "retained",
            Metric::TotalLtv => "totalLtv",
            Metric::TotalDiscount => "totalDiscount",
            Metric::FillRate => "fillRate",
            Metric::BookingRate => "bookingRate",
            Metric::CancellationRate => "cancellationRate",
            Metric::ShowUpRate => "showUpRate",
            Metric::ClassAverage => "classAverage",
            Metric::AvgRevenue => "avgRevenue",
            Metric::RevenuePerAttendee => "revenuePerAttendee",
            Metric::ConversionRate => "conversionRate",
            Metric::RetentionRate => "retentionRate",
            Metric::AvgLtv => "avgLtv",
            Metric::AvgVisits => "avgVisits",
            Metric::AvgDiscount => "avgDiscount",
            Metric::AvgConversionSpan => "avgConversionSpan",
            Metric::RevenueScore => "revenueScore",
            Metric::Consistency => "consistency",
            Metric::OverallScore => "overallScore",
        }
    }

    /// Value of this metric for a group; `None` when the group has no data
    /// for it (only the conversion span can be absent).
    pub fn value(&self, aggregate: &Aggregate, metrics: &GroupMetrics) -> Option<f64> {
        let t = &aggregate.totals;
        let value = match self {
            Metric::Count => t.count as f64,
            Metric::TotalAttendance => t.attendance,
            Metric::TotalCapacity => t.capacity,
            Metric::TotalRevenue => t.revenue,
            Metric::TotalBookings => t.bookings,
            Metric::TotalCancellations => t.cancellations,
            Metric::NewClients => t.new_clients,
            Metric::Converted => t.converted,
            Metric::Retained => t.retained,
            Metric::TotalLtv => t.ltv,
            Metric::TotalDiscount => t.discount,
            Metric::FillRate => metrics.fill_rate,
            Metric::BookingRate => metrics.booking_rate,
            Metric::CancellationRate => metrics.cancellation_rate,
            Metric::ShowUpRate => metrics.show_up_rate,
            Metric::ClassAverage => metrics.class_average,
            Metric::AvgRevenue => metrics.avg_revenue,
            Metric::RevenuePerAttendee => metrics.revenue_per_attendee,
            Metric::ConversionRate => metrics.conversion_rate,
            Metric::RetentionRate => metrics.retention_rate,
            Metric::AvgLtv => metrics.avg_ltv,
            Metric::AvgVisits => metrics.avg_visits,
            Metric::AvgDiscount => metrics.avg_discount,
            Metric::AvgConversionSpan => return metrics.avg_conversion_span,
            Metric::RevenueScore => metrics.revenue_score,
            Metric::Consistency => metrics.consistency,
            Metric::OverallScore => metrics.overall_score,
        };
        Some(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        let alias = match canonical.as_str() {
            "sessions" | "records" | "classes" => Some(Metric::Count),
            "attendance" | "checkedin" => Some(Metric::TotalAttendance),
            "capacity" => Some(Metric::TotalCapacity),
            "revenue" => Some(Metric::TotalRevenue),
            "bookings" | "booked" => Some(Metric::TotalBookings),
            "cancellations" | "latecancellations" => Some(Metric::TotalCancellations),
            "avgattendance" | "averageattendance" => Some(Metric::ClassAverage),
            "score" | "performancescore" => Some(Metric::OverallScore),
            "ltv" => Some(Metric::TotalLtv),
            "discount" => Some(Metric::TotalDiscount),
            _ => None,
        };
        alias
            .or_else(|| {
                Metric::ALL
                    .iter()
                    .copied()
                    .find(|m| m.as_str().to_lowercase() == canonical)
            })
            .ok_or_else(|| EngineError::UnknownMetric(s.to_string()))
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
