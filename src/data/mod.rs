/// Data layer: core types, loading, writing and selection.
///
/// Architecture:
/// ```text
///  .txt / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + validate → CalibrationTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ CalibrationTable │  key → CalibrationRecord, detector index
///   └──────────────────┘
///        │                     │
///        ▼                     ▼
///   ┌──────────┐         ┌──────────┐
///   │  filter   │         │  writer   │  text / json / csv
///   └──────────┘         └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
