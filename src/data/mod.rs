/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table → typed records (column mapping)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Datasets  │  Vec<DelayRecord>, Vec<AccidentRecord>, load reports
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  train / date range / severity → filtered view
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │ aggregate │   │ summary  │  top-N grouped means, KPIs
///   └──────────┘   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod summary;
