//! Additive per-record contributions.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Running sums carried by a record or a group of records.
///
/// Every field is a plain sum, so combining measures is associative and
/// commutative: the totals of a group do not depend on the order in which
/// its records were folded in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measures {
    pub count: u64,
    pub attendance: f64,
    /// Sum of squared per-record attendance, used for the consistency score.
    pub attendance_sq: f64,
    pub capacity: f64,
    pub revenue: f64,
    pub bookings: f64,
    pub cancellations: f64,
    pub new_clients: f64,
    pub converted: f64,
    pub retained: f64,
    pub ltv: f64,
    pub visits: f64,
    pub discount: f64,
    pub conversion_span_days: f64,
    pub conversion_span_samples: u64,
}

impl Measures {
    /// Measures of a single record with the given attendance.
    pub fn single(attendance: f64) -> Self {
        Self {
            count: 1,
            attendance,
            attendance_sq: attendance * attendance,
            ..Default::default()
        }
    }
}

impl Add for Measures {
    type Output = Measures;

    fn add(mut self, rhs: Measures) -> Measures {
        self += rhs;
        self
    }
}

impl AddAssign for Measures {
    fn add_assign(&mut self, rhs: Measures) {
        self.count += rhs.count;
        self.attendance += rhs.attendance;
        self.attendance_sq += rhs.attendance_sq;
        self.capacity += rhs.capacity;
        self.revenue += rhs.revenue;
        self.bookings += rhs.bookings;
        self.cancellations += rhs.cancellations;
        self.new_clients += rhs.new_clients;
        self.converted += rhs.converted;
        self.retained += rhs.retained;
        self.ltv += rhs.ltv;
        self.visits += rhs.visits;
        self.discount += rhs.discount;
        self.conversion_span_days += rhs.conversion_span_days;
        self.conversion_span_samples += rhs.conversion_span_samples;
    }
}

impl std::iter::Sum for Measures {
    fn sum<I: Iterator<Item = Measures>>(iter: I) -> Self {
        iter.fold(Measures::default(), Add::add)
    }
}
