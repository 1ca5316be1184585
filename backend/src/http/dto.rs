//! Data Transfer Objects for the HTTP API.
//!
//! Engine results already derive Serialize/Deserialize and are re-exported
//! from [`crate::api`]; this module adds the request/response wrappers that
//! only the HTTP layer needs.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    CreateDatasetRequest, DatasetInfo, GroupedView, HierarchyNode, RawDrillDown, ViewRequest,
};
pub use crate::services::CacheStats;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Repository status
    pub database: String,
    pub cache: CacheStats,
}

/// Response for listing datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetListResponse {
    pub datasets: Vec<DatasetInfo>,
    pub total: usize,
}

/// `levels` parameter of the hierarchy endpoint. The remaining query
/// parameters are read as a [`ViewRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyQuery {
    pub levels: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyResponse {
    pub levels: String,
    pub nodes: Vec<HierarchyNode>,
}

/// `key` parameter of the drill-down endpoint, in the `|`-joined display
/// form (literal `|` and `\` inside a value escaped with `\`) or
/// `#<index>` for single records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillDownQuery {
    pub key: String,
}
