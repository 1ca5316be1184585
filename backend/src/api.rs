//! Public API surface.
//!
//! Consolidates the DTO types shared by the service layer and the HTTP API.
//! All types derive Serialize/Deserialize for JSON serialization.

use serde::{Deserialize, Serialize};

use crate::define_id_type;
use crate::models::{RawRecord, RecordKind};

define_id_type!(i64, DatasetId);

pub use crate::engine::{
    DrillDown, EngineError, Extremes, GroupBy, GroupKey, GroupMetrics, GroupRow, GroupedView,
    HierarchyNode, Metric, Page, RateBasis, SortDirection, SortField, Totals, ViewConfig,
    ViewRequest,
};
pub use crate::models::Measures;

/// A stored dataset: the raw rows of one record kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub kind: RecordKind,
    pub rows: Vec<RawRecord>,
    /// SHA-256 of the kind and rows, used to detect duplicate uploads.
    pub checksum: String,
}

impl Dataset {
    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            row_count: self.rows.len(),
            checksum: self.checksum.clone(),
        }
    }
}

/// Dataset listing entry, without rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: DatasetId,
    pub name: String,
    pub kind: RecordKind,
    pub row_count: usize,
    pub checksum: String,
}

/// Body of a dataset upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    /// Record kind name, e.g. `sessions` or `leads`.
    pub kind: String,
    pub rows: Vec<RawRecord>,
}

/// Drill-down payload with the constituent rows as they were uploaded.
pub type RawDrillDown = DrillDown<RawRecord>;
