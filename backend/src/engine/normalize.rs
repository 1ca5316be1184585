//! Record normalizer: raw heterogeneous rows to typed records.
//!
//! Normalization is total. Missing, null or unparseable numeric fields become
//! `0`, currency-formatted strings are stripped before parsing, missing text
//! becomes `None`, and the derived day-of-week / month fields are filled from
//! the record date.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::{
    ClientRecord, LeadRecord, RawRecord, RecordKind, SaleRecord, SessionRecord,
};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

const TRUE_WORDS: &[&str] = &[
    "true", "yes", "y", "1", "converted", "retained", "member", "new",
];

// Field aliases, in canonical form (lower-case alphanumerics only).
const SESSION_CLASS: &[&str] = &["cleanedclass", "class", "classname", "classtype", "sessionname"];
const SESSION_TRAINER: &[&str] = &["trainer", "trainername", "teacher", "teachername", "instructor"];
const SESSION_LOCATION: &[&str] = &["location", "studio", "center", "centre"];
const SESSION_DAY: &[&str] = &["dayofweek", "day", "weekday"];
const SESSION_TIME: &[&str] = &["time", "classtime", "starttime"];
const SESSION_DATE: &[&str] = &["date", "classdate", "sessiondate"];
const SESSION_CAPACITY: &[&str] = &["capacity", "totalcapacity", "maxcapacity"];
const SESSION_CHECKED_IN: &[&str] = &["checkedin", "checkins", "checkedincount", "attendance", "attended"];
const SESSION_BOOKED: &[&str] = &["booked", "bookings", "bookedcount", "totalbookings"];
const SESSION_CANCELLED: &[&str] = &["latecancelled", "latecancellations", "cancellations", "cancelled"];
const SESSION_REVENUE: &[&str] = &["totalpaid", "revenue", "paid", "amount"];
const SESSION_NEW: &[&str] = &["newclients", "newclientcount", "newmembers"];
const SESSION_CONVERTED: &[&str] = &["convertedclients", "converted", "conversions"];
const SESSION_RETAINED: &[&str] = &["retainedclients", "retained"];

const LEAD_SOURCE: &[&str] = &["source", "leadsource"];
const LEAD_ASSOCIATE: &[&str] = &["associate", "salesassociate", "owner"];
const LEAD_CENTER: &[&str] = &["center", "centre", "location"];
const LEAD_STAGE: &[&str] = &["stage"];
const LEAD_STATUS: &[&str] = &["status"];
const LEAD_CREATED: &[&str] = &["createdat", "createddate", "created", "date"];
const LEAD_LTV: &[&str] = &["ltv", "lifetimevalue"];
const LEAD_VISITS: &[&str] = &["visits", "visitcount", "totalvisits"];
const LEAD_CONVERTED: &[&str] = &["conversionstatus", "converted", "isconverted"];
const LEAD_RETAINED: &[&str] = &["retentionstatus", "retained", "isretained"];

const CLIENT_ID: &[&str] = &["memberid", "clientid", "id"];
const CLIENT_NAME: &[&str] = &["name", "clientname", "fullname"];
const CLIENT_TRAINER: &[&str] = &["trainer", "trainername", "firstvisittrainer"];
const CLIENT_LOCATION: &[&str] = &["firstvisitlocation", "location", "homelocation"];
const CLIENT_DATE: &[&str] = &["firstvisitdate", "firstvisit", "date"];
const CLIENT_MEMBERSHIP: &[&str] = &["membershiptype", "membership", "membershipused"];
const CLIENT_IS_NEW: &[&str] = &["isnew", "newclient"];
const CLIENT_CONVERTED: &[&str] = &["conversionstatus", "converted", "isconverted"];
const CLIENT_RETAINED: &[&str] = &["retentionstatus", "retained", "isretained"];
const CLIENT_LTV: &[&str] = &["ltv", "lifetimevalue"];
const CLIENT_VISITS: &[&str] = &["visitsposttrial", "visitspostrial", "visits"];
const CLIENT_SPAN: &[&str] = &["conversionspan", "conversionspandays", "daystoconversion"];

const SALE_PRODUCT: &[&str] = &["cleanedproduct", "product", "paymentitem", "item"];
const SALE_CATEGORY: &[&str] = &["cleanedcategory", "category"];
const SALE_LOCATION: &[&str] = &["calculatedlocation", "location"];
const SALE_SELLER: &[&str] = &["soldby", "seller", "associate"];
const SALE_CUSTOMER: &[&str] = &["customername", "customer", "customeremail"];
const SALE_METHOD: &[&str] = &["paymentmethod", "paymentmode"];
const SALE_DATE: &[&str] = &["paymentdate", "date"];
const SALE_VALUE: &[&str] = &["paymentvalue", "amount", "value", "revenue"];
const SALE_DISCOUNT: &[&str] = &["discountamount", "discount"];
const SALE_DISCOUNT_PCT: &[&str] = &["discountpercentage", "discountpercent"];

/// Typed records of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedRecords {
    Sessions(Vec<SessionRecord>),
    Leads(Vec<LeadRecord>),
    Clients(Vec<ClientRecord>),
    Sales(Vec<SaleRecord>),
}

impl NormalizedRecords {
    pub fn kind(&self) -> RecordKind {
        match self {
            NormalizedRecords::Sessions(_) => RecordKind::Sessions,
            NormalizedRecords::Leads(_) => RecordKind::Leads,
            NormalizedRecords::Clients(_) => RecordKind::Clients,
            NormalizedRecords::Sales(_) => RecordKind::Sales,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NormalizedRecords::Sessions(r) => r.len(),
            NormalizedRecords::Leads(r) => r.len(),
            NormalizedRecords::Clients(r) => r.len(),
            NormalizedRecords::Sales(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluate `$body` with `$rows` bound to the typed records held by
/// `$records`, whichever kind they are.
macro_rules! with_records {
    ($records:expr, $rows:ident => $body:expr) => {
        match $records {
            $crate::engine::normalize::NormalizedRecords::Sessions($rows) => $body,
            $crate::engine::normalize::NormalizedRecords::Leads($rows) => $body,
            $crate::engine::normalize::NormalizedRecords::Clients($rows) => $body,
            $crate::engine::normalize::NormalizedRecords::Sales($rows) => $body,
        }
    };
}
pub(crate) use with_records;

/// Normalize every row of a dataset according to its kind.
pub fn normalize_rows(kind: RecordKind, rows: &[RawRecord]) -> NormalizedRecords {
    match kind {
        RecordKind::Sessions => NormalizedRecords::Sessions(rows.iter().map(normalize_session).collect()),
        RecordKind::Leads => NormalizedRecords::Leads(rows.iter().map(normalize_lead).collect()),
        RecordKind::Clients => NormalizedRecords::Clients(rows.iter().map(normalize_client).collect()),
        RecordKind::Sales => NormalizedRecords::Sales(rows.iter().map(normalize_sale).collect()),
    }
}

pub fn normalize_session(row: &RawRecord) -> SessionRecord {
    let fields = FieldIndex::new(row);
    let date = fields.date(SESSION_DATE);
    SessionRecord {
        class_name: fields.text(SESSION_CLASS),
        trainer: fields.text(SESSION_TRAINER),
        location: fields.text(SESSION_LOCATION),
        day_of_week: day_of_week(fields.text(SESSION_DAY), date),
        time: fields.text(SESSION_TIME).map(|t| normalize_time(&t)),
        date,
        month: date.map(month_of),
        capacity: fields.number(SESSION_CAPACITY),
        checked_in: fields.number(SESSION_CHECKED_IN),
        booked: fields.number(SESSION_BOOKED),
        late_cancelled: fields.number(SESSION_CANCELLED),
        revenue: fields.number(SESSION_REVENUE),
        new_clients: fields.number(SESSION_NEW),
        converted_clients: fields.number(SESSION_CONVERTED),
        retained_clients: fields.number(SESSION_RETAINED),
    }
}

pub fn normalize_lead(row: &RawRecord) -> LeadRecord {
    let fields = FieldIndex::new(row);
    let created_at = fields.date(LEAD_CREATED);
    LeadRecord {
        source: fields.text(LEAD_SOURCE),
        associate: fields.text(LEAD_ASSOCIATE),
        center: fields.text(LEAD_CENTER),
        stage: fields.text(LEAD_STAGE),
        status: fields.text(LEAD_STATUS),
        created_at,
        day_of_week: day_of_week(None, created_at),
        month: created_at.map(month_of),
        ltv: fields.number(LEAD_LTV),
        visits: fields.number(LEAD_VISITS),
        converted: fields.flag(LEAD_CONVERTED).unwrap_or(false),
        retained: fields.flag(LEAD_RETAINED).unwrap_or(false),
    }
}

pub fn normalize_client(row: &RawRecord) -> ClientRecord {
    let fields = FieldIndex::new(row);
    let first_visit_date = fields.date(CLIENT_DATE);
    ClientRecord {
        member_id: fields.text(CLIENT_ID),
        name: fields.text(CLIENT_NAME),
        trainer: fields.text(CLIENT_TRAINER),
        first_visit_location: fields.text(CLIENT_LOCATION),
        first_visit_date,
        membership: fields.text(CLIENT_MEMBERSHIP),
        day_of_week: day_of_week(None, first_visit_date),
        month: first_visit_date.map(month_of),
        // Client rows describe new members unless they say otherwise.
        is_new: fields.flag(CLIENT_IS_NEW).unwrap_or(true),
        converted: fields.flag(CLIENT_CONVERTED).unwrap_or(false),
        retained: fields.flag(CLIENT_RETAINED).unwrap_or(false),
        ltv: fields.number(CLIENT_LTV),
        visits_post_trial: fields.number(CLIENT_VISITS),
        conversion_span_days: fields.optional_number(CLIENT_SPAN),
    }
}

pub fn normalize_sale(row: &RawRecord) -> SaleRecord {
    let fields = FieldIndex::new(row);
    let payment_date = fields.date(SALE_DATE);
    SaleRecord {
        product: fields.text(SALE_PRODUCT),
        category: fields.text(SALE_CATEGORY),
        location: fields.text(SALE_LOCATION),
        seller: fields.text(SALE_SELLER),
        customer: fields.text(SALE_CUSTOMER),
        payment_method: fields.text(SALE_METHOD),
        payment_date,
        day_of_week: day_of_week(None, payment_date),
        month: payment_date.map(month_of),
        payment_value: fields.number(SALE_VALUE),
        discount_amount: fields.number(SALE_DISCOUNT),
        discount_percentage: fields.number(SALE_DISCOUNT_PCT),
    }
}

/// Lower-case a field name and drop everything but ASCII letters and digits.
pub fn canonical_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Row view keyed by canonical field name.
struct FieldIndex<'a> {
    fields: HashMap<String, &'a Value>,
}

impl<'a> FieldIndex<'a> {
    fn new(row: &'a RawRecord) -> Self {
        let mut fields = HashMap::with_capacity(row.len());
        for (name, value) in row {
            fields.entry(canonical_field_name(name)).or_insert(value);
        }
        Self { fields }
    }

    /// First alias carrying a non-null, non-blank value.
    fn get(&self, aliases: &[&str]) -> Option<&'a Value> {
        aliases.iter().find_map(|alias| {
            self.fields.get(*alias).copied().filter(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
        })
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        self.get(aliases).and_then(value_to_text)
    }

    fn number(&self, aliases: &[&str]) -> f64 {
        self.get(aliases).map(parse_number).unwrap_or(0.0)
    }

    fn optional_number(&self, aliases: &[&str]) -> Option<f64> {
        self.get(aliases).and_then(parse_optional_number)
    }

    fn flag(&self, aliases: &[&str]) -> Option<bool> {
        self.get(aliases).map(parse_flag)
    }

    fn date(&self, aliases: &[&str]) -> Option<NaiveDate> {
        self.get(aliases).and_then(parse_date)
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a numeric field, resolving anything unusable to `0`.
pub fn parse_number(value: &Value) -> f64 {
    parse_optional_number(value).unwrap_or(0.0)
}

/// Parse a numeric field; `None` when the value is absent or unparseable.
///
/// Strings are read as their first numeric token: digits with `,` thousands
/// separators, an optional decimal part and an optional exponent. Currency
/// prefixes (`Rs.`, `INR`, `₹`, `$`) and trailing decorations (`/-`, `%`) are
/// skipped. A `-` before the token or accounting-style parentheses mark a
/// negative amount. Text with a second number after the token (ranges, dates)
/// is rejected.
pub fn parse_optional_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => parse_numeric_text(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    let starts_number = |i: usize| {
        bytes[i].is_ascii_digit()
            || (bytes[i] == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
    };
    let start = (0..bytes.len()).find(|&i| starts_number(i))?;

    let (token, len) = numeric_token(&bytes[start..]);
    if trimmed[start + len..].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = token.parse::<f64>().ok()?;

    let accounting = trimmed.starts_with('(') && trimmed.ends_with(')');
    let negative = accounting || trimmed[..start].contains('-');
    Some(if negative { -value } else { value })
}

/// Longest numeric token at the start of `bytes`, with separators removed,
/// and the number of bytes it spans.
fn numeric_token(bytes: &[u8]) -> (String, usize) {
    let digit_at = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);
    let mut token = String::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_digit() => token.push(b as char),
            b',' if !token.is_empty() && digit_at(i + 1) => {}
            _ => break,
        }
        i += 1;
    }

    if bytes.get(i) == Some(&b'.') && digit_at(i + 1) {
        token.push('.');
        i += 1;
        while digit_at(i) {
            token.push(bytes[i] as char);
            i += 1;
        }
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        let sign = match bytes.get(j) {
            Some(&b) if b == b'+' || b == b'-' => {
                j += 1;
                Some(b as char)
            }
            _ => None,
        };
        if digit_at(j) {
            token.push('e');
            token.extend(sign);
            while digit_at(j) {
                token.push(bytes[j] as char);
                j += 1;
            }
            i = j;
        }
    }

    (token, i)
}

/// Interpret a status field as a yes/no flag.
pub fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => {
            let lowered = s.trim().to_lowercase();
            TRUE_WORDS.contains(&lowered.as_str())
        }
        _ => false,
    }
}

/// Parse a date from the formats seen in exported sheets.
///
/// Slash dates are read day-first, falling back to month-first when the
/// day-first reading is impossible.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = match value {
        Value::String(s) => s.trim(),
        _ => return None,
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Canonicalize a clock time to `HH:MM`; unrecognized text is kept as-is.
pub fn normalize_time(text: &str) -> String {
    let trimmed = text.trim();
    let upper = trimmed.to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&upper, format).ok())
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

fn day_of_week(explicit: Option<String>, date: Option<NaiveDate>) -> Option<String> {
    match explicit {
        Some(day) => Some(normalize_day_name(&day)),
        None => date.map(|d| weekday_name(d.weekday()).to_string()),
    }
}

fn normalize_day_name(day: &str) -> String {
    match day.trim().to_lowercase().as_str() {
        "mon" | "monday" => "Monday".to_string(),
        "tue" | "tues" | "tuesday" => "Tuesday".to_string(),
        "wed" | "wednesday" => "Wednesday".to_string(),
        "thu" | "thur" | "thurs" | "thursday" => "Thursday".to_string(),
        "fri" | "friday" => "Friday".to_string(),
        "sat" | "saturday" => "Saturday".to_string(),
        "sun" | "sunday" => "Sunday".to_string(),
        _ => day.trim().to_string(),
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod normalize_tests;
