//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! analytics service.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::dto::{
    CreateDatasetRequest, DatasetInfo, DatasetListResponse, DrillDownQuery, GroupedView,
    HealthResponse, HierarchyQuery, HierarchyResponse, RawDrillDown, ViewRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::DatasetId;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Query string extractor whose failures surface as JSON `BAD_REQUEST` errors.
type QueryParams<T> = Result<Query<T>, QueryRejection>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is usable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.service.repository().health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
        cache: state.service.cache_stats(),
    }))
}

// =============================================================================
// Dataset CRUD
// =============================================================================

/// GET /v1/datasets
pub async fn list_datasets(State(state): State<AppState>) -> HandlerResult<DatasetListResponse> {
    let datasets = state.service.list_datasets().await?;
    let total = datasets.len();
    Ok(Json(DatasetListResponse { datasets, total }))
}

/// POST /v1/datasets
///
/// Store a dataset. Uploading content identical to an existing dataset
/// returns the existing entry.
pub async fn create_dataset(
    State(state): State<AppState>,
    request: Result<Json<CreateDatasetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DatasetInfo>), AppError> {
    let Json(request) = request?;
    let info = state.service.create_dataset(request).await?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// DELETE /v1/datasets/{dataset_id}
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
) -> HandlerResult<DatasetInfo> {
    let info = state.service.delete_dataset(DatasetId::new(dataset_id)).await?;
    Ok(Json(info))
}

// =============================================================================
// Analytics Endpoints
// =============================================================================

/// GET /v1/datasets/{dataset_id}/view
///
/// Grouped, ranked and paginated view with top/bottom performers and totals.
pub async fn get_view(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
    request: QueryParams<ViewRequest>,
) -> HandlerResult<GroupedView> {
    let Query(request) = request?;
    let view = state
        .service
        .view(DatasetId::new(dataset_id), &request)
        .await?;
    Ok(Json(Arc::unwrap_or_clone(view)))
}

/// GET /v1/datasets/{dataset_id}/hierarchy
pub async fn get_hierarchy(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
    query: QueryParams<HierarchyQuery>,
    request: QueryParams<ViewRequest>,
) -> HandlerResult<HierarchyResponse> {
    let (Query(query), Query(request)) = (query?, request?);
    let nodes = state
        .service
        .hierarchy(DatasetId::new(dataset_id), &query.levels, &request)
        .await?;
    Ok(Json(HierarchyResponse {
        levels: query.levels,
        nodes,
    }))
}

/// GET /v1/datasets/{dataset_id}/drilldown
pub async fn get_drilldown(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
    query: QueryParams<DrillDownQuery>,
    request: QueryParams<ViewRequest>,
) -> HandlerResult<RawDrillDown> {
    let (Query(query), Query(request)) = (query?, request?);
    let payload = state
        .service
        .drill_down(DatasetId::new(dataset_id), &request, &query.key)
        .await?;
    Ok(Json(payload))
}

/// GET /v1/datasets/{dataset_id}/records/{index}
pub async fn get_record(
    State(state): State<AppState>,
    Path((dataset_id, index)): Path<(i64, usize)>,
) -> HandlerResult<RawDrillDown> {
    let payload = state
        .service
        .record_detail(DatasetId::new(dataset_id), index)
        .await?;
    Ok(Json(payload))
}
