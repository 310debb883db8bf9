/// Data layer: the frame model, type inference, projection and loading.
///
/// Architecture:
/// ```text
///  API JSON / .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse source → DataFrameModel
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ DataFrameModel │  columns, data, index, index_names
///   └────────────────┘
///        │
///        ├──────────────► export (CSV / XLSX)
///        ▼
///   ┌───────────┐
///   │ inference │  column / index level → text | number | decimal
///   └───────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ projection │  typed column descriptors + keyed row records
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  type-driven sort order and row predicates
///   └──────────┘
/// ```

pub mod filter;
pub mod inference;
pub mod loader;
pub mod model;
pub mod projection;
