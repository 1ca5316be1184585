//! Dataset storage.
//!
//! Uploaded datasets are kept behind the [`repository::DatasetRepository`]
//! trait so the service layer does not depend on a particular store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP API / service layer                               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository trait (repository/) - abstract interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! Duplicate uploads are detected by a SHA-256 checksum of the dataset's
//! kind and rows (see [`checksum`]).

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod models;
pub mod repositories;
pub mod repository;

pub use repositories::LocalRepository;
pub use repository::{DatasetRepository, ErrorContext, RepositoryError, RepositoryResult};
