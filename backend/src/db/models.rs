//! Shared data models re-exported for database layer consumers.

pub use crate::api::{Dataset, DatasetId, DatasetInfo};
pub use crate::models::{RawRecord, RecordKind};
