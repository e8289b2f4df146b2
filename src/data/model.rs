use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{TableError, TableResult};

// ---------------------------------------------------------------------------
// InstrumentKey – INSTRUMENT_DETECTOR_FILTER
// ---------------------------------------------------------------------------

/// Structured form of a table key such as `ACS_WFC_F814W` or `WFC3_UVIS_F275W`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentKey {
    instrument: String,
    detector: String,
    filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid instrument key '{key}': {reason}")]
pub struct InvalidKey {
    pub key: String,
    pub reason: String,
}

impl InstrumentKey {
    pub fn new(instrument: &str, detector: &str, filter: &str) -> Result<Self, InvalidKey> {
        format!("{instrument}_{detector}_{filter}").parse()
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn detector(&self) -> &str {
        &self.detector
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl FromStr for InstrumentKey {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| InvalidKey {
            key: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 3 {
            return Err(invalid("expected INSTRUMENT_DETECTOR_FILTER"));
        }
        for part in &parts {
            if part.is_empty() {
                return Err(invalid("empty component"));
            }
            if !part
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            {
                return Err(invalid("components must be uppercase letters and digits"));
            }
        }

        Ok(InstrumentKey {
            instrument: parts[0].to_string(),
            detector: parts[1].to_string(),
            filter: parts[2].to_string(),
        })
    }
}

impl TryFrom<String> for InstrumentKey {
    type Error = InvalidKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstrumentKey> for String {
    fn from(key: InstrumentKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.instrument, self.detector, self.filter)
    }
}

// ---------------------------------------------------------------------------
// CalibrationRecord – one row of the table
// ---------------------------------------------------------------------------

/// Calibration constants for one instrument/detector/filter combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub key: InstrumentKey,
    /// Effective wavelength in nanometres (`eft_wave`).
    pub effective_wavelength_nm: f64,
    pub ci_lower: f64,
    pub ci_peak: f64,
    pub ci_upper: f64,
    /// Magnitude offset from the photometric aperture to infinite aperture.
    pub aperture_correction: f64,
    /// Free-text provenance note. Never used in computation.
    #[serde(default)]
    pub comment: Option<String>,
}

impl CalibrationRecord {
    /// Whether two rows carry the same calibration, ignoring the comment.
    pub fn same_values(&self, other: &CalibrationRecord) -> bool {
        self.key == other.key
            && self.effective_wavelength_nm == other.effective_wavelength_nm
            && self.ci_lower == other.ci_lower
            && self.ci_peak == other.ci_peak
            && self.ci_upper == other.ci_upper
            && self.aperture_correction == other.aperture_correction
    }

    /// Name of the first numeric field that is NaN or infinite.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("eft_wave", self.effective_wavelength_nm),
            ("ci_lower", self.ci_lower),
            ("ci_peak", self.ci_peak),
            ("ci_upper", self.ci_upper),
            ("ap_cor", self.aperture_correction),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }

    /// Describe the first broken calibration invariant, if any.
    pub fn invariant_violation(&self) -> Option<String> {
        if self.effective_wavelength_nm <= 0.0 {
            return Some(format!(
                "effective wavelength must be positive, got {}",
                self.effective_wavelength_nm
            ));
        }
        if self.ci_lower > self.ci_peak {
            return Some(format!(
                "ci_lower {} exceeds ci_peak {}",
                self.ci_lower, self.ci_peak
            ));
        }
        if self.ci_peak > self.ci_upper {
            return Some(format!(
                "ci_peak {} exceeds ci_upper {}",
                self.ci_peak, self.ci_upper
            ));
        }
        None
    }

    /// Whether a measured concentration index falls inside `[ci_lower, ci_upper]`.
    pub fn ci_in_range(&self, ci: f64) -> bool {
        ci >= self.ci_lower && ci <= self.ci_upper
    }
}

impl fmt::Display for CalibrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  eft_wave={} nm  ci=[{}, {}, {}]  ap_cor={}",
            self.key,
            self.effective_wavelength_nm,
            self.ci_lower,
            self.ci_peak,
            self.ci_upper,
            self.aperture_correction
        )?;
        if let Some(comment) = &self.comment {
            write!(f, "  # {comment}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CalibrationTable – the complete loaded table
// ---------------------------------------------------------------------------

/// Immutable key → record mapping with a pre-computed detector index.
///
/// Built once by the loader; there are no mutating methods, so a shared
/// reference can be read from any number of threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationTable {
    records: BTreeMap<String, CalibrationRecord>,
    /// instrument → detectors present in the table.
    detectors: BTreeMap<String, BTreeSet<String>>,
}

impl CalibrationTable {
    /// Build the table and its index. Keys must already be unique.
    pub(crate) fn from_records(records: Vec<CalibrationRecord>) -> Self {
        let mut detectors: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for rec in &records {
            detectors
                .entry(rec.key.instrument().to_string())
                .or_default()
                .insert(rec.key.detector().to_string());
        }
        let records = records
            .into_iter()
            .map(|rec| (rec.key.to_string(), rec))
            .collect();
        CalibrationTable { records, detectors }
    }

    /// Exact-match lookup. An absent key is an error, never a default record.
    pub fn lookup(&self, key: &str) -> TableResult<&CalibrationRecord> {
        self.records.get(key).ok_or_else(|| TableError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Lookup by components, e.g. `("WFC3", "UVIS", "F606W")`.
    pub fn lookup_parts(
        &self,
        instrument: &str,
        detector: &str,
        filter: &str,
    ) -> TableResult<&CalibrationRecord> {
        self.lookup(&format!("{instrument}_{detector}_{filter}"))
    }

    pub fn get(&self, key: &str) -> Option<&CalibrationRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &CalibrationRecord> {
        self.records.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.detectors.keys().map(String::as_str)
    }

    /// Detectors of `instrument` present in the table (empty if unknown).
    pub fn detectors(&self, instrument: &str) -> impl Iterator<Item = &str> {
        self.detectors
            .get(instrument)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}
