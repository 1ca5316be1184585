//! Analytics service: loads datasets from the repository and runs the
//! engine over them.

use std::sync::Arc;

use crate::api::{
    CreateDatasetRequest, DatasetId, DatasetInfo, GroupedView, HierarchyNode, RawDrillDown,
    ViewConfig, ViewRequest,
};
use crate::config::AnalyticsConfig;
use crate::db::repository::{DatasetRepository, RepositoryError};
use crate::engine::normalize::with_records;
use crate::engine::{
    build_hierarchy, drill_down, normalize_rows, parse_levels, record_detail, run_view, EngineError,
};
use crate::models::{RawRecord, RecordKind};

use super::cache::{CacheStats, ViewCache};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Group '{key}' not found in dataset {dataset_id}")]
    GroupNotFound { dataset_id: DatasetId, key: String },

    #[error("Record {index} not found in dataset {dataset_id}")]
    RecordNotFound { dataset_id: DatasetId, index: usize },
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Arc<dyn DatasetRepository>,
    config: Arc<AnalyticsConfig>,
    cache: ViewCache,
}

impl AnalyticsService {
    pub fn new(repository: Arc<dyn DatasetRepository>, config: AnalyticsConfig) -> Self {
        let cache = ViewCache::new(config.engine.cache_capacity);
        Self {
            repository,
            config: Arc::new(config),
            cache,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn DatasetRepository> {
        &self.repository
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn create_dataset(&self, request: CreateDatasetRequest) -> ServiceResult<DatasetInfo> {
        let kind: RecordKind = request.kind.parse()?;
        Ok(self
            .repository
            .store_dataset(&request.name, kind, request.rows)
            .await?)
    }

    pub async fn list_datasets(&self) -> ServiceResult<Vec<DatasetInfo>> {
        Ok(self.repository.list_datasets().await?)
    }

    pub async fn delete_dataset(&self, id: DatasetId) -> ServiceResult<DatasetInfo> {
        let info = self.repository.delete_dataset(id).await?;
        let dropped = self.cache.invalidate(id);
        log::debug!("Deleted dataset {}, dropped {} cached views", id, dropped);
        Ok(info)
    }

    /// Grouped, ranked and paginated view of a dataset.
    pub async fn view(&self, id: DatasetId, request: &ViewRequest) -> ServiceResult<Arc<GroupedView>> {
        let info = self.repository.get_dataset_info(id).await?;
        let config = ViewConfig::resolve(request, &self.config.view_settings(), info.kind)?;

        let key = ViewCache::key(&info.checksum, &config).map_err(RepositoryError::from)?;
        if let Some(view) = self.cache.get(&key) {
            log::debug!("View cache hit for dataset {}", id);
            return Ok(view);
        }

        let dataset = self.repository.get_dataset(id).await?;
        let records = normalize_rows(dataset.kind, &dataset.rows);
        let view = Arc::new(with_records!(&records, rows => run_view(rows, &config)));
        self.cache.insert(key, id, Arc::clone(&view));
        Ok(view)
    }

    /// Tree over `levels` (comma separated) of the records the request's
    /// filters keep, siblings ranked by the request's sort and direction.
    pub async fn hierarchy(
        &self,
        id: DatasetId,
        levels: &str,
        request: &ViewRequest,
    ) -> ServiceResult<Vec<HierarchyNode>> {
        let levels = parse_levels(levels)?;
        let dataset = self.repository.get_dataset(id).await?;
        let config = ViewConfig::resolve(request, &self.config.view_settings(), dataset.kind)?;

        let records = normalize_rows(dataset.kind, &dataset.rows);
        let tree = with_records!(&records, rows => build_hierarchy(
            rows,
            &config.filter,
            &levels,
            &config.metrics,
            config.sort,
            config.direction,
        ))?;
        Ok(tree)
    }

    /// Drill into the group displayed as `key` under the request's grouping
    /// and filters. The payload carries the rows as uploaded.
    pub async fn drill_down(
        &self,
        id: DatasetId,
        request: &ViewRequest,
        key: &str,
    ) -> ServiceResult<RawDrillDown> {
        let dataset = self.repository.get_dataset(id).await?;
        let config = ViewConfig::resolve(request, &self.config.view_settings(), dataset.kind)?;

        let records = normalize_rows(dataset.kind, &dataset.rows);
        let payload = with_records!(&records, rows => drill_down(rows, &config, key)
            .map(|found| {
                let raw = raw_rows(&dataset.rows, &found.members);
                found.with_records(raw)
            }));
        payload.ok_or_else(|| ServiceError::GroupNotFound {
            dataset_id: id,
            key: key.to_string(),
        })
    }

    /// Payload of the single record at `index`.
    pub async fn record_detail(&self, id: DatasetId, index: usize) -> ServiceResult<RawDrillDown> {
        let dataset = self.repository.get_dataset(id).await?;
        let metrics = self.config.metrics_config();

        let records = normalize_rows(dataset.kind, &dataset.rows);
        let payload = with_records!(&records, rows => record_detail(rows, index, &metrics)
            .map(|found| {
                let raw = raw_rows(&dataset.rows, &found.members);
                found.with_records(raw)
            }));
        payload.ok_or(ServiceError::RecordNotFound {
            dataset_id: id,
            index,
        })
    }
}

fn raw_rows(rows: &[RawRecord], members: &[usize]) -> Vec<RawRecord> {
    members
        .iter()
        .filter_map(|&position| rows.get(position).cloned())
        .collect()
}
