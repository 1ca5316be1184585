//! Aggregation engine.
//!
//! A pure, synchronous pipeline over already-loaded records:
//!
//! ```text
//! raw rows ─► normalize ─► filter ─► group ─► aggregate ─► metrics
//!                                                            │
//!              extremes ◄─ paginate ◄─ rank ◄────────────────┘
//! ```
//!
//! Nothing here performs I/O or holds state between calls. Callers own the
//! [`view::ViewConfig`] and pass it in on every run.

pub mod aggregate;
pub mod drilldown;
pub mod error;
pub mod extremes;
pub mod filter;
pub mod grouping;
pub mod hierarchy;
pub mod metrics;
pub mod normalize;
pub mod pagination;
pub mod pipeline;
pub mod ranking;
pub mod view;

pub use aggregate::{group_records, total, Aggregate, Group};
pub use drilldown::{drill_down, record_detail, DrillDown};
pub use error::{EngineError, EngineResult};
pub use extremes::{extract_extremes, Extremes};
pub use filter::RecordFilter;
pub use grouping::{GroupBy, GroupKey};
pub use hierarchy::{build_hierarchy, parse_levels, HierarchyNode};
pub use metrics::{compute_metrics, GroupMetrics, Metric, MetricsConfig, RateBasis, ScoreWeights};
pub use normalize::{normalize_rows, NormalizedRecords};
pub use pagination::{paginate, Page};
pub use pipeline::{ranked_groups, run_view, GroupRow, GroupedView, Totals};
pub use ranking::{rank, Rankable, SortDirection, SortField};
pub use view::{ViewConfig, ViewRequest, ViewSettings};
