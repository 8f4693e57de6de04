/// Data layer: core types, loading, and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / .xlsx
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Column>, each Vec<Cell>
///   └──────────┘
///        │   (crate::clean)
///        ▼
///   ┌──────────┐
///   │  export   │  Table → .csv / JSON records
///   └──────────┘
/// ```

pub mod export;
pub mod loader;
pub mod model;
