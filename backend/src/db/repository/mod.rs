//! Repository trait and error types.

pub mod dataset;
pub mod error;

pub use dataset::DatasetRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
