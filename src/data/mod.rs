/// Data layer: canonical rows, building, loading, and filtering.
///
/// Architecture:
/// ```text
///  .json mapping            .json records / .csv / .parquet
///        │                              │
///        ▼                              │
///   ┌──────────┐                        │
///   │  builder  │  ModelEstimates → rows │
///   └──────────┘                        │
///        │                              │
///        ▼                              ▼
///   ┌─────────────────┐
///   │ ComparisonTable  │  validated rows, derived std, model/group index
///   └─────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  model / group predicates → visible row ids
///   └──────────┘
/// ```

pub mod builder;
pub mod filter;
pub mod loader;
pub mod model;
