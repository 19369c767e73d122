/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → GameTable (cached by content hash)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  genre / developer / publisher selections → derived view
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────┐
///   │ kpi + aggregate │  scalars, top titles, per-group totals
///   └─────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  everything the dashboard renders, memoised
///   └──────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod kpi;
pub mod loader;
pub mod model;
pub mod summary;
