//! # Studio Analytics
//!
//! Aggregation engine for fitness-studio operational data.
//!
//! Sessions, leads, clients and sales arrive as loosely-typed rows exported
//! from spreadsheets and booking systems. This crate normalizes them, groups
//! them by any combination of class, trainer, location, day and time, derives
//! rates and a composite performance score per group, and returns ranked,
//! paginated views with top and bottom performers and drill-down payloads.
//!
//! ## Features
//!
//! - **Normalization**: currency strings, loose flags and mixed date formats
//!   resolve to typed records; bad values become 0 or "Unknown", never errors
//! - **Grouping**: 25 grouping presets plus hierarchical day → time → class trees
//! - **Metrics**: fill, booking, cancellation, show-up, conversion and
//!   retention rates, averages and a weighted overall score
//! - **Views**: stable ranking, pagination and top/bottom extraction
//! - **HTTP API**: dataset upload and view endpoints (feature `http-server`)
//!
//! ## Architecture
//!
//! - [`engine`]: the pure aggregation pipeline
//! - [`models`]: typed record models and dimensions
//! - [`api`]: DTOs shared by services and the HTTP API
//! - [`config`]: TOML and environment configuration
//! - [`db`]: dataset repository
//! - [`services`]: orchestration and view caching
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
