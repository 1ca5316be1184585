//! Configuration errors raised by the aggregation engine.
//!
//! Malformed field values and zero denominators never surface here: those are
//! resolved locally to `"Unknown"` and `0`. Only selections that name something
//! the engine does not know about are errors.

/// Result type for engine configuration.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown grouping strategy: '{0}'")]
    UnknownGrouping(String),

    #[error("Unknown metric: '{0}'")]
    UnknownMetric(String),

    #[error("Unknown sort direction: '{0}' (expected 'asc' or 'desc')")]
    UnknownDirection(String),

    #[error("Unknown record kind: '{0}'")]
    UnknownRecordKind(String),

    #[error("Unknown rate basis: '{0}'")]
    UnknownRateBasis(String),

    #[error("Invalid date: '{0}'")]
    InvalidDate(String),

    #[error("Invalid page size: {0} (must be a positive integer)")]
    InvalidPageSize(usize),

    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),
}
