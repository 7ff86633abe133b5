/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CaseDataset (invalid rows dropped)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ CaseDataset  │  Vec<CaseRecord>, per-dimension indexes
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply selection → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  KPIs, grouped counts, top-N, durations
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
