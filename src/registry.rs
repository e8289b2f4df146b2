//! Process-wide calibration table.
//!
//! The table is set at most once and only read afterwards, so callers on any
//! thread can hold `&'static CalibrationTable` without locking. Reloading means
//! building a fresh [`CalibrationTable`] and passing it around explicitly.

use std::path::Path;

use log::info;
use once_cell::sync::OnceCell;

use crate::config::LoadOptions;
use crate::data::loader::load_file;
use crate::data::model::CalibrationTable;
use crate::error::{TableError, TableResult};

static TABLE: OnceCell<CalibrationTable> = OnceCell::new();

/// Install `table` as the process-wide table.
pub fn install(table: CalibrationTable) -> TableResult<&'static CalibrationTable> {
    let installed = TABLE
        .try_insert(table)
        .map_err(|_| TableError::AlreadyInstalled)?;
    info!("installed process-wide calibration table ({} records)", installed.len());
    Ok(installed)
}

/// Load `path` and install it.
pub fn load_global(path: &Path, options: &LoadOptions) -> TableResult<&'static CalibrationTable> {
    install(load_file(path, options)?)
}

/// The installed table, if any.
pub fn global() -> Option<&'static CalibrationTable> {
    TABLE.get()
}

/// The installed table, installing the bundled one on first use.
pub fn global_or_bundled() -> TableResult<&'static CalibrationTable> {
    TABLE.get_or_try_init(CalibrationTable::bundled)
}
