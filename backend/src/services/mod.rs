//! Service layer for business logic and orchestration.
//!
//! Services sit between the dataset repository and the HTTP API: they load
//! datasets, resolve view configuration and run the aggregation engine.

pub mod analytics;
pub mod cache;

pub use analytics::{AnalyticsService, ServiceError, ServiceResult};
pub use cache::{CacheStats, ViewCache};
