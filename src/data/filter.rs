use super::model::{CalibrationRecord, CalibrationTable};

// ---------------------------------------------------------------------------
// Record selection by instrument / detector / wavelength
// ---------------------------------------------------------------------------

/// Selection criteria. A `None` field places no constraint.
///
/// This narrows the table to a subset; it never substitutes one filter's
/// calibration for another's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Compared case-insensitively.
    pub instrument: Option<String>,
    /// Compared case-insensitively.
    pub detector: Option<String>,
    /// Inclusive lower bound on the effective wavelength (nm).
    pub min_wavelength_nm: Option<f64>,
    /// Inclusive upper bound on the effective wavelength (nm).
    pub max_wavelength_nm: Option<f64>,
}

impl RecordFilter {
    pub fn instrument(name: &str) -> Self {
        RecordFilter {
            instrument: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_detector(mut self, name: &str) -> Self {
        self.detector = Some(name.to_string());
        self
    }

    pub fn with_wavelength_range(mut self, min_nm: f64, max_nm: f64) -> Self {
        self.min_wavelength_nm = Some(min_nm);
        self.max_wavelength_nm = Some(max_nm);
        self
    }

    /// Whether `record` passes every active constraint.
    pub fn matches(&self, record: &CalibrationRecord) -> bool {
        if let Some(instrument) = &self.instrument {
            if !record.key.instrument().eq_ignore_ascii_case(instrument) {
                return false;
            }
        }
        if let Some(detector) = &self.detector {
            if !record.key.detector().eq_ignore_ascii_case(detector) {
                return false;
            }
        }
        let wave = record.effective_wavelength_nm;
        if self.min_wavelength_nm.is_some_and(|min| wave < min) {
            return false;
        }
        if self.max_wavelength_nm.is_some_and(|max| wave > max) {
            return false;
        }
        true
    }
}

/// Records passing `filter`, in key order.
pub fn select<'a>(
    table: &'a CalibrationTable,
    filter: &RecordFilter,
) -> Vec<&'a CalibrationRecord> {
    table.iter().filter(|rec| filter.matches(rec)).collect()
}
