//! View configuration: raw caller selections resolved into a typed,
//! immutable [`ViewConfig`].
//!
//! Resolution runs in one of two modes. Strict mode rejects any selection
//! the engine does not recognise. Lenient mode logs a warning and substitutes
//! a safe default so the view still renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::num::NonZeroUsize;
use std::str::FromStr;

use super::error::{EngineError, EngineResult};
use super::filter::RecordFilter;
use super::grouping::GroupBy;
use super::metrics::{MetricsConfig, RateBasis};
use super::normalize::parse_date;
use super::ranking::{SortDirection, SortField};
use crate::models::RecordKind;

/// Selections as they arrive from a caller. Every field is optional and
/// list-valued filters are comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewRequest {
    pub group_by: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub min_sample: Option<u64>,
    pub top: Option<usize>,
    pub bottom: Option<usize>,
    pub class: Option<String>,
    pub trainer: Option<String>,
    pub location: Option<String>,
    pub day: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub search: Option<String>,
    pub conversion_basis: Option<String>,
    pub retention_basis: Option<String>,
}

/// Engine defaults and limits applied during resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub strict: bool,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub min_sample_size: u64,
    pub top_n: usize,
    pub bottom_n: usize,
    pub metrics: MetricsConfig,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            strict: cfg!(debug_assertions),
            default_page_size: 25,
            max_page_size: 500,
            min_sample_size: 3,
            top_n: 5,
            bottom_n: 5,
            metrics: MetricsConfig::default(),
        }
    }
}

impl ViewSettings {
    fn default_page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.default_page_size).unwrap_or(NonZeroUsize::MIN)
    }

    fn max_page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_page_size).unwrap_or(NonZeroUsize::MIN)
    }
}

/// Fully resolved view selection. Serializes deterministically, which the
/// view cache relies on for its keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    pub kind: RecordKind,
    pub group_by: GroupBy,
    pub sort: SortField,
    pub direction: SortDirection,
    pub page: usize,
    pub page_size: NonZeroUsize,
    pub min_sample: u64,
    pub top_n: usize,
    pub bottom_n: usize,
    pub filter: RecordFilter,
    pub metrics: MetricsConfig,
}

impl ViewConfig {
    /// Defaults for `kind`: no grouping, sorted descending by the kind's
    /// headline metric, first page.
    pub fn new(kind: RecordKind, settings: &ViewSettings) -> Self {
        Self {
            kind,
            group_by: GroupBy::None,
            sort: SortField::Metric(kind.default_metric()),
            direction: SortDirection::Desc,
            page: 1,
            page_size: settings.default_page_size(),
            min_sample: settings.min_sample_size,
            top_n: settings.top_n,
            bottom_n: settings.bottom_n,
            filter: RecordFilter::default(),
            metrics: settings.metrics,
        }
    }

    /// Sample threshold for the top/bottom lists. Under `none` every group
    /// is a single record, so the threshold drops to 1.
    pub fn effective_min_sample(&self) -> u64 {
        match self.group_by {
            GroupBy::None => self.min_sample.min(1),
            _ => self.min_sample,
        }
    }

    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_sort(mut self, sort: impl Into<SortField>, direction: SortDirection) -> Self {
        self.sort = sort.into();
        self.direction = direction;
        self
    }

    pub fn with_page(mut self, page: usize, page_size: NonZeroUsize) -> Self {
        self.page = page.max(1);
        self.page_size = page_size;
        self
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_extremes(mut self, min_sample: u64, top_n: usize, bottom_n: usize) -> Self {
        self.min_sample = min_sample;
        self.top_n = top_n;
        self.bottom_n = bottom_n;
        self
    }

    /// Resolve a caller's request against engine settings.
    pub fn resolve(
        request: &ViewRequest,
        settings: &ViewSettings,
        kind: RecordKind,
    ) -> EngineResult<ViewConfig> {
        let defaults = ViewConfig::new(kind, settings);
        let strict = settings.strict;

        let group_by = choose(request.group_by.as_deref(), defaults.group_by, strict)?;
        let sort = choose(request.sort.as_deref(), defaults.sort, strict)?;
        let direction = choose(request.direction.as_deref(), defaults.direction, strict)?;

        let mut metrics = settings.metrics;
        metrics.conversion_basis =
            choose(request.conversion_basis.as_deref(), metrics.conversion_basis, strict)?;
        metrics.retention_basis =
            choose(request.retention_basis.as_deref(), metrics.retention_basis, strict)?;

        let page_size = match request.page_size {
            None => defaults.page_size,
            Some(requested) => match NonZeroUsize::new(requested) {
                Some(size) => size.min(settings.max_page_size()),
                None if strict => return Err(EngineError::InvalidPageSize(requested)),
                None => {
                    log::warn!(
                        "Invalid page size {}, using default {}",
                        requested,
                        defaults.page_size
                    );
                    defaults.page_size
                }
            },
        };

        let filter = RecordFilter::default()
            .with_classes(split_list(request.class.as_deref()))
            .with_trainers(split_list(request.trainer.as_deref()))
            .with_locations(split_list(request.location.as_deref()))
            .with_days(split_list(request.day.as_deref()))
            .with_date_range(
                choose_date(request.from.as_deref(), strict)?,
                choose_date(request.to.as_deref(), strict)?,
            )
            .with_search(request.search.as_deref());

        Ok(ViewConfig {
            kind,
            group_by,
            sort,
            direction,
            page: request.page.unwrap_or(1).max(1),
            page_size,
            min_sample: request.min_sample.unwrap_or(defaults.min_sample),
            top_n: request.top.unwrap_or(defaults.top_n),
            bottom_n: request.bottom.unwrap_or(defaults.bottom_n),
            filter,
            metrics,
        })
    }
}

/// Parse an optional selection, applying the strict/lenient policy on
/// failure. Blank input means "not selected".
fn choose<T>(raw: Option<&str>, fallback: T, strict: bool) -> EngineResult<T>
where
    T: FromStr<Err = EngineError> + Debug,
{
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(fallback);
    };
    match text.parse::<T>() {
        Ok(value) => Ok(value),
        Err(err) if strict => Err(err),
        Err(err) => {
            log::warn!("{}; falling back to {:?}", err, fallback);
            Ok(fallback)
        }
    }
}

fn choose_date(raw: Option<&str>, strict: bool) -> EngineResult<Option<chrono::NaiveDate>> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match parse_date(&Value::String(text.to_string())) {
        Some(date) => Ok(Some(date)),
        None if strict => Err(EngineError::InvalidDate(text.to_string())),
        None => {
            log::warn!("Ignoring unparseable date bound '{}'", text);
            Ok(None)
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|s| s.split(',').map(str::trim).filter(|v| !v.is_empty()).collect())
        .unwrap_or_default()
}
