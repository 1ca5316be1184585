//! In-memory repository for development and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::checksum::dataset_checksum;
use crate::db::models::{Dataset, DatasetId, DatasetInfo, RawRecord, RecordKind};
use crate::db::repository::{DatasetRepository, ErrorContext, RepositoryError, RepositoryResult};

#[derive(Debug)]
struct LocalData {
    datasets: BTreeMap<DatasetId, Dataset>,
    next_id: DatasetId,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            datasets: BTreeMap::new(),
            next_id: DatasetId::new(1),
        }
    }
}

/// Dataset store held entirely in memory. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DatasetRepository for LocalRepository {
    async fn store_dataset(
        &self,
        name: &str,
        kind: RecordKind,
        rows: Vec<RawRecord>,
    ) -> RepositoryResult<DatasetInfo> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Dataset name must not be empty",
                ErrorContext::new("store_dataset").with_entity("dataset"),
            ));
        }
        let checksum = dataset_checksum(kind, &rows)
            .map_err(|e| RepositoryError::from(e).with_operation("store_dataset"))?;

        let mut data = self.data.write();
        if let Some(existing) = data.datasets.values().find(|d| d.checksum == checksum) {
            log::info!(
                "Dataset '{}' matches existing dataset {} (checksum {}), skipping store",
                name,
                existing.id,
                checksum
            );
            return Ok(existing.info());
        }

        let id = data.next_id;
        data.next_id = id.next();
        let dataset = Dataset {
            id,
            name: name.to_string(),
            kind,
            rows,
            checksum,
        };
        let info = dataset.info();
        data.datasets.insert(id, dataset);
        log::info!("Stored {} dataset {} '{}' ({} rows)", kind, id, name, info.row_count);
        Ok(info)
    }

    async fn get_dataset(&self, id: DatasetId) -> RepositoryResult<Dataset> {
        self.data.read().datasets.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Dataset {} not found", id),
                ErrorContext::new("get_dataset")
                    .with_entity("dataset")
                    .with_entity_id(id),
            )
        })
    }

    async fn get_dataset_info(&self, id: DatasetId) -> RepositoryResult<DatasetInfo> {
        self.data
            .read()
            .datasets
            .get(&id)
            .map(Dataset::info)
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Dataset {} not found", id),
                    ErrorContext::new("get_dataset_info")
                        .with_entity("dataset")
                        .with_entity_id(id),
                )
            })
    }

    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>> {
        Ok(self.data.read().datasets.values().map(Dataset::info).collect())
    }

    async fn delete_dataset(&self, id: DatasetId) -> RepositoryResult<DatasetInfo> {
        self.data
            .write()
            .datasets
            .remove(&id)
            .map(|dataset| dataset.info())
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Dataset {} not found", id),
                    ErrorContext::new("delete_dataset")
                        .with_entity("dataset")
                        .with_entity_id(id),
                )
            })
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
