//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AnalyticsConfig;
use crate::db::repository::DatasetRepository;
use crate::services::AnalyticsService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Analytics service wrapping the dataset repository
    pub service: AnalyticsService,
}

impl AppState {
    /// Create a new application state with the given repository and configuration.
    pub fn new(repository: Arc<dyn DatasetRepository>, config: AnalyticsConfig) -> Self {
        Self {
            service: AnalyticsService::new(repository, config),
        }
    }
}
