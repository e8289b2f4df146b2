//! Aperture-correction and concentration-index calibration table for HST
//! instrument/detector/filter combinations (ACS, WFC3, WFPC2).
//!
//! ```no_run
//! use std::path::Path;
//!
//! let table = hst_apcor::load(Path::new("ci_ap_cor_table.txt"))?;
//! let f814w = table.lookup("ACS_WFC_F814W")?;
//! println!("aperture correction: {}", f814w.aperture_correction);
//! # Ok::<(), hst_apcor::TableError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod registry;

pub use config::{DuplicatePolicy, LoadOptions, ValidationPolicy};
pub use data::filter::{select, RecordFilter};
pub use data::loader::{load, load_file, parse_table};
pub use data::model::{CalibrationRecord, CalibrationTable, InstrumentKey, InvalidKey};
pub use data::writer::{save_file, write_csv, write_json, write_text};
pub use error::{TableError, TableResult};

/// Exact-key lookup, failing with [`TableError::KeyNotFound`] when absent.
pub fn lookup<'a>(table: &'a CalibrationTable, key: &str) -> TableResult<&'a CalibrationRecord> {
    table.lookup(key)
}
