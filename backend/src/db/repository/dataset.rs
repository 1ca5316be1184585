//! Dataset repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::models::{Dataset, DatasetId, DatasetInfo, RawRecord, RecordKind};

/// Storage for uploaded datasets.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Store a dataset.
    ///
    /// Content is deduplicated by checksum: storing rows identical to an
    /// existing dataset of the same kind returns that dataset's info and
    /// stores nothing.
    ///
    /// # Returns
    /// * `Ok(DatasetInfo)` - The stored (or existing) dataset
    /// * `Err(RepositoryError)` - If the name is empty
    async fn store_dataset(
        &self,
        name: &str,
        kind: RecordKind,
        rows: Vec<RawRecord>,
    ) -> RepositoryResult<DatasetInfo>;

    /// Fetch a dataset with its rows.
    async fn get_dataset(&self, id: DatasetId) -> RepositoryResult<Dataset>;

    /// Fetch a dataset's metadata and checksum without copying its rows.
    async fn get_dataset_info(&self, id: DatasetId) -> RepositoryResult<DatasetInfo>;

    /// List all datasets, ordered by id.
    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>>;

    /// Delete a dataset, returning what was removed.
    async fn delete_dataset(&self, id: DatasetId) -> RepositoryResult<DatasetInfo>;

    /// Check that the store is usable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
