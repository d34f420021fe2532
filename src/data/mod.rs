/// Data layer: core types, loading, filtering, statistics, and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, column index
///   └──────────┘
///        │
///        ├──────────────┬──────────────┐
///        ▼              ▼              ▼
///   ┌──────────┐   ┌──────────┐   ┌──────────┐
///   │  filter   │   │ summary   │   │  export   │
///   └──────────┘   └──────────┘   └──────────┘
///    matching rows   per-column     CSV download
///    + diagnostics   statistics
/// ```
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
