use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info, warn};

use super::model::{CalibrationRecord, CalibrationTable, InstrumentKey, InvalidKey};
use crate::config::{DuplicatePolicy, LoadOptions, ValidationPolicy};
use crate::error::{TableError, TableResult};

/// Key, wavelength, lower, peak, upper, aperture correction.
pub const FIELD_COUNT: usize = 6;

const BUNDLED_TABLE: &str = include_str!("../../data/ci_ap_cor_table.txt");

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a calibration table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.txt` / `.dat` / none – whitespace-separated six-column text (native)
/// * `.json` – `[{ "key": "ACS_WFC_F814W", "effective_wavelength_nm": 811.0, ... }, ...]`
/// * `.csv`  – header row with the record field names, `comment` optional
pub fn load_file(path: &Path, options: &LoadOptions) -> TableResult<CalibrationTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let text = std::fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;

    let table = match ext.as_str() {
        "txt" | "dat" | "" => parse_table(&text, options)?,
        "json" => parse_json(&text, options)?,
        "csv" => parse_csv(&text, options)?,
        other => return Err(TableError::UnsupportedFormat(other.to_string())),
    };

    info!(
        "loaded {} calibration records from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

/// [`load_file`] with default options.
pub fn load(path: &Path) -> TableResult<CalibrationTable> {
    load_file(path, &LoadOptions::default())
}

impl CalibrationTable {
    /// The reference table shipped with the crate.
    pub fn bundled() -> TableResult<Self> {
        parse_table(BUNDLED_TABLE, &LoadOptions::default())
    }

    pub fn parse(text: &str) -> TableResult<Self> {
        parse_table(text, &LoadOptions::default())
    }
}

// ---------------------------------------------------------------------------
// Native text format
// ---------------------------------------------------------------------------

/// Parse the six-column text format.
///
/// ```text
/// # comment line
/// ACS_WFC_F814W   811.   0.9   1.08   1.25   -0.29   # optional note
/// ```
pub fn parse_table(text: &str, options: &LoadOptions) -> TableResult<CalibrationTable> {
    let mut builder = TableBuilder::new(options);
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if let Some(record) = parse_line(line_no, raw)? {
            builder.push(line_no, record)?;
        }
    }
    Ok(builder.finish())
}

/// Parse a single line. Blank and comment lines yield `None`.
pub fn parse_line(line_no: usize, raw: &str) -> TableResult<Option<CalibrationRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (data, comment) = match trimmed.split_once('#') {
        Some((data, comment)) => (data, Some(comment.trim())),
        None => (trimmed, None),
    };
    let comment = comment.filter(|c| !c.is_empty()).map(str::to_string);

    let fields: Vec<&str> = data.split_whitespace().collect();
    if fields.len() != FIELD_COUNT {
        return Err(malformed(
            line_no,
            trimmed,
            format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }

    let key: InstrumentKey = fields[0]
        .parse()
        .map_err(|e: InvalidKey| malformed(line_no, trimmed, e.to_string()))?;

    let number = |idx: usize, name: &str| -> TableResult<f64> {
        let tok = fields[idx];
        match tok.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(_) => Err(malformed(
                line_no,
                trimmed,
                format!("{name} '{tok}' is not finite"),
            )),
            Err(_) => Err(malformed(
                line_no,
                trimmed,
                format!("{name} '{tok}' is not a number"),
            )),
        }
    };

    Ok(Some(CalibrationRecord {
        key,
        effective_wavelength_nm: number(1, "eft_wave")?,
        ci_lower: number(2, "ci_lower")?,
        ci_peak: number(3, "ci_peak")?,
        ci_upper: number(4, "ci_upper")?,
        aperture_correction: number(5, "ap_cor")?,
        comment,
    }))
}

fn malformed(line: usize, text: &str, reason: String) -> TableError {
    TableError::MalformedRow {
        line,
        text: text.to_string(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON array. Row `i` is reported as line `i + 1`.
pub fn parse_json(text: &str, options: &LoadOptions) -> TableResult<CalibrationTable> {
    let records: Vec<CalibrationRecord> = serde_json::from_str(text)?;

    let mut builder = TableBuilder::new(options);
    for (i, record) in records.into_iter().enumerate() {
        builder.push(i + 1, record)?;
    }
    Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row naming the record fields; `comment` may be absent
/// or empty. Rows are reported by file line (header is line 1).
pub fn parse_csv(text: &str, options: &LoadOptions) -> TableResult<CalibrationTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut builder = TableBuilder::new(options);
    for (row_no, result) in reader.deserialize::<CalibrationRecord>().enumerate() {
        let record = result?;
        builder.push(row_no + 2, record)?;
    }
    Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// Shared validation / duplicate handling
// ---------------------------------------------------------------------------

struct TableBuilder<'a> {
    options: &'a LoadOptions,
    /// key → (line first seen, record)
    rows: BTreeMap<String, (usize, CalibrationRecord)>,
}

impl<'a> TableBuilder<'a> {
    fn new(options: &'a LoadOptions) -> Self {
        TableBuilder {
            options,
            rows: BTreeMap::new(),
        }
    }

    fn push(&mut self, line: usize, record: CalibrationRecord) -> TableResult<()> {
        let key = record.key.to_string();

        if let Some(field) = record.non_finite_field() {
            return Err(malformed(line, &key, format!("{field} is not finite")));
        }

        if let Some(reason) = record.invariant_violation() {
            match self.options.validation {
                ValidationPolicy::Strict => {
                    return Err(TableError::InvariantViolation { line, key, reason });
                }
                ValidationPolicy::Warn => {
                    warn!("line {line}: keeping '{key}' despite invalid calibration: {reason}");
                }
            }
        }

        if let Some((first_line, existing)) = self.rows.get(&key) {
            let identical = existing.same_values(&record);
            if identical && self.options.duplicates == DuplicatePolicy::AllowIdentical {
                warn!("line {line}: ignoring repeat of '{key}' (first on line {first_line})");
                return Ok(());
            }
            debug!("line {line}: duplicate '{key}', identical values: {identical}");
            return Err(TableError::DuplicateKey {
                key,
                first_line: *first_line,
                line,
            });
        }

        self.rows.insert(key, (line, record));
        Ok(())
    }

    fn finish(self) -> CalibrationTable {
        debug!("built calibration table with {} records", self.rows.len());
        CalibrationTable::from_records(self.rows.into_values().map(|(_, rec)| rec).collect())
    }
}
