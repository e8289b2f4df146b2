use std::fmt::Write as _;
use std::path::Path;

use log::info;

use super::model::{CalibrationRecord, CalibrationTable};
use crate::error::{TableError, TableResult};

/// Column header written at the top of every text table.
pub const TEXT_HEADER: &str = "#Instrument_filter\teft_wave\tci_lower\tci_peak\tci_upper\tap_cor";

/// Format one record as a data line of the six-column text format.
///
/// Floats use the shortest representation that parses back to the same
/// value, so a written table re-loads to an identical mapping.
pub fn format_line(record: &CalibrationRecord) -> String {
    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        record.key,
        record.effective_wavelength_nm,
        record.ci_lower,
        record.ci_peak,
        record.ci_upper,
        record.aperture_correction
    );
    if let Some(comment) = &record.comment {
        // the text format is line based
        let comment = comment.replace(['\r', '\n'], " ");
        let comment = comment.trim();
        if !comment.is_empty() {
            let _ = write!(line, "\t# {comment}");
        }
    }
    line
}

/// Serialize the table to the native text format, records in key order.
pub fn write_text(table: &CalibrationTable) -> String {
    let mut out = String::new();
    out.push_str(TEXT_HEADER);
    out.push('\n');
    for record in table.iter() {
        out.push_str(&format_line(record));
        out.push('\n');
    }
    out
}

pub fn write_json(table: &CalibrationTable) -> TableResult<String> {
    let records: Vec<&CalibrationRecord> = table.iter().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn write_csv(table: &CalibrationTable) -> TableResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in table.iter() {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a table to disk.  Format chosen by extension, as in
/// [`load_file`](super::loader::load_file).
pub fn save_file(table: &CalibrationTable, path: &Path) -> TableResult<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let content = match ext.as_str() {
        "txt" | "dat" | "" => write_text(table),
        "json" => write_json(table)?,
        "csv" => write_csv(table)?,
        other => return Err(TableError::UnsupportedFormat(other.to_string())),
    };

    std::fs::write(path, content).map_err(|e| TableError::io(path, e))?;
    info!("wrote {} calibration records to {}", table.len(), path.display());
    Ok(())
}
