/// Data layer: core types, loading, and date normalization.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset (dtype per column)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  ordered columns, Vec<Row>
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize │  text columns that are all dates → DateTime
///   └───────────┘
/// ```

pub mod loader;
pub mod model;
pub mod normalize;
