//! Bounded memo of computed views.
//!
//! Views are pure functions of a dataset's content and a resolved
//! [`ViewConfig`], so the cache key is a SHA-256 over the dataset checksum and
//! the serialized configuration. Storage and eviction are delegated to moka.

use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::{DatasetId, GroupedView, ViewConfig};
use crate::db::checksum::calculate_checksum;

/// Hit/miss counters, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Clone)]
pub struct ViewCache {
    capacity: usize,
    // None when caching is disabled
    views: Option<Cache<String, (DatasetId, Arc<GroupedView>)>>,
    counters: Arc<Counters>,
}

impl ViewCache {
    /// A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        let views = (capacity > 0).then(|| {
            Cache::builder()
                .max_capacity(capacity as u64)
                .support_invalidation_closures()
                .build()
        });
        Self {
            capacity,
            views,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Cache key of a view over the dataset with `dataset_checksum`.
    pub fn key(dataset_checksum: &str, config: &ViewConfig) -> Result<String, serde_json::Error> {
        let config = serde_json::to_string(config)?;
        Ok(calculate_checksum(&format!("{}\n{}", dataset_checksum, config)))
    }

    pub fn get(&self, key: &str) -> Option<Arc<GroupedView>> {
        let found = self
            .views
            .as_ref()
            .and_then(|views| views.get(key))
            .map(|(_, view)| view);
        let counter = if found.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, key: String, dataset_id: DatasetId, view: Arc<GroupedView>) {
        if let Some(views) = &self.views {
            views.insert(key, (dataset_id, view));
        }
    }

    /// Drop every view computed from `dataset_id`, returning how many were
    /// cached.
    pub fn invalidate(&self, dataset_id: DatasetId) -> usize {
        let Some(views) = &self.views else {
            return 0;
        };
        let dropped = views.iter().filter(|(_, (id, _))| *id == dataset_id).count();
        if let Err(err) = views.invalidate_entries_if(move |_, (id, _)| *id == dataset_id) {
            log::warn!("Failed to invalidate views of dataset {}: {}", dataset_id, err);
        }
        views.run_pending_tasks();
        dropped
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.views.as_ref().map_or(0, |views| {
            views.run_pending_tasks();
            views.entry_count() as usize
        });
        CacheStats {
            entries,
            capacity: self.capacity,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{run_view, ViewSettings};
    use crate::models::{RecordKind, SessionRecord};

    fn config() -> ViewConfig {
        ViewConfig::new(RecordKind::Sessions, &ViewSettings::default())
    }

    fn view() -> Arc<GroupedView> {
        let records: Vec<SessionRecord> = vec![];
        Arc::new(run_view(&records, &config()))
    }

    #[test]
    fn test_key_depends_on_checksum_and_config() {
        let a = ViewCache::key("abc", &config()).unwrap();
        let b = ViewCache::key("abd", &config()).unwrap();
        let c = ViewCache::key(
            "abc",
            &config().with_group_by(crate::engine::GroupBy::Class),
        )
        .unwrap();
        assert_eq!(a, ViewCache::key("abc", &config()).unwrap());
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_counts_hits_and_misses() {
        let cache = ViewCache::new(4);
        cache.insert("a".to_string(), DatasetId::new(1), view());
        assert!(cache.get("a").is_some());
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let cache = ViewCache::new(2);
        for key in ["a", "b", "c", "d", "e"] {
            cache.insert(key.to_string(), DatasetId::new(1), view());
        }
        assert!(cache.stats().entries <= 2);
    }

    #[test]
    fn test_invalidate_by_dataset() {
        let cache = ViewCache::new(4);
        cache.insert("a".to_string(), DatasetId::new(1), view());
        cache.insert("b".to_string(), DatasetId::new(2), view());
        cache.insert("c".to_string(), DatasetId::new(1), view());
        assert_eq!(cache.invalidate(DatasetId::new(1)), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_none());
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = ViewCache::new(0);
        cache.insert("a".to_string(), DatasetId::new(1), view());
        assert!(cache.get("a").is_none());
        assert_eq!(cache.invalidate(DatasetId::new(1)), 0);
        assert_eq!(cache.stats().entries, 0);
    }
}
