use std::collections::BTreeMap;

use hst_apcor::{
    load, lookup, parse_table, write_text, CalibrationRecord, CalibrationTable, LoadOptions,
    TableError,
};
use proptest::prelude::*;

fn calibration(rec: &CalibrationRecord) -> (f64, f64, f64, f64, f64) {
    (
        rec.effective_wavelength_nm,
        rec.ci_lower,
        rec.ci_peak,
        rec.ci_upper,
        rec.aperture_correction,
    )
}

#[test]
fn acs_wfc_f814w_reference_values() {
    let table = CalibrationTable::bundled().unwrap();
    let rec = lookup(&table, "ACS_WFC_F814W").unwrap();
    assert_eq!(calibration(rec), (811.0, 0.9, 1.08, 1.25, -0.29));
}

#[test]
fn wfpc2_pc_f850l_reference_values() {
    let table = CalibrationTable::bundled().unwrap();
    let rec = lookup(&table, "WFPC2_PC_F850L").unwrap();
    assert_eq!(calibration(rec), (930.0, 0.5929, 0.77, 0.9548, -0.23));
}

#[test]
fn absent_key_is_an_error_not_a_default() {
    let table = CalibrationTable::bundled().unwrap();
    match lookup(&table, "NONEXISTENT_FILTER") {
        Err(TableError::KeyNotFound { key }) => assert_eq!(key, "NONEXISTENT_FILTER"),
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
}

#[test]
fn lookup_is_exact_match_only() {
    let table = CalibrationTable::bundled().unwrap();
    assert!(table.get("acs_wfc_f814w").is_none());
    assert!(table.get("ACS_WFC_F814").is_none());
    assert!(table.get(" ACS_WFC_F814W").is_none());
}

#[test]
fn five_field_line_is_reported_with_its_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ci_ap_cor_table.txt");
    std::fs::write(
        &path,
        "# eft_wave ci_lower ci_peak ci_upper ap_cor\n\
         ACS_WFC_F814W 811. 0.9 1.08 1.25 -0.29\n\
         WFPC2_PC_F850L 930. 0.5929 0.77 0.9548\n",
    )
    .unwrap();

    let err = load(&path).unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert!(err.to_string().contains("WFPC2_PC_F850L 930. 0.5929 0.77 0.9548"));
}

#[test]
fn bundled_table_upholds_invariants() {
    let table = CalibrationTable::bundled().unwrap();
    assert!(!table.is_empty());
    for rec in table.iter() {
        assert!(rec.effective_wavelength_nm > 0.0, "{}", rec.key);
        assert!(rec.ci_lower <= rec.ci_peak, "{}", rec.key);
        assert!(rec.ci_peak <= rec.ci_upper, "{}", rec.key);
    }
}

#[test]
fn tables_can_be_read_concurrently() {
    let table = CalibrationTable::bundled().unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                assert_eq!(table.lookup("ACS_WFC_F814W").unwrap().ci_peak, 1.08);
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn key_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("ACS"), Just("WFC3"), Just("WFPC2")],
        prop_oneof![
            Just("WFC"),
            Just("HRC"),
            Just("UVIS"),
            Just("IR"),
            Just("WF"),
            Just("PC")
        ],
        "F[0-9]{3}[WMLN]",
    )
        .prop_map(|(inst, det, filter)| format!("{inst}_{det}_{filter}"))
}

/// Six numeric columns that satisfy the calibration invariants.
fn values_strategy() -> impl Strategy<Value = (f64, f64, f64, f64, f64)> {
    (
        100.0..2000.0f64,
        0.0..2.0f64,
        0.0..1.0f64,
        0.0..1.0f64,
        -1.0..0.0f64,
    )
        .prop_map(|(wave, lower, d1, d2, ap_cor)| {
            let peak = lower + d1;
            (wave, lower, peak, peak + d2, ap_cor)
        })
}

fn comment_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z][a-z0-9 ,.()]{0,30}[a-z0-9]")
}

fn table_text(rows: &BTreeMap<String, ((f64, f64, f64, f64, f64), Option<String>)>) -> String {
    let mut text = String::from("# generated\n");
    for (key, ((wave, lower, peak, upper, ap_cor), comment)) in rows {
        // mixed separators and precision, as found in hand-maintained tables
        text.push_str(&format!("{key}\t{wave}  {lower} \t{peak}   {upper}\t{ap_cor:e}"));
        if let Some(comment) = comment {
            text.push_str(&format!("  # {comment}"));
        }
        text.push('\n');
    }
    text
}

proptest! {
    #[test]
    fn prop_text_round_trip(
        rows in prop::collection::btree_map(
            key_strategy(),
            (values_strategy(), comment_strategy()),
            1..20,
        )
    ) {
        let table = parse_table(&table_text(&rows), &LoadOptions::default()).unwrap();
        prop_assert_eq!(table.len(), rows.len());

        let again = parse_table(&write_text(&table), &LoadOptions::default()).unwrap();
        prop_assert_eq!(&table, &again);
    }

    #[test]
    fn prop_accepted_rows_satisfy_invariants(
        key in key_strategy(),
        wave in -10.0..2000.0f64,
        lower in -1.0..2.0f64,
        peak in -1.0..2.0f64,
        upper in -1.0..2.0f64,
        ap_cor in -1.0..1.0f64,
    ) {
        let line = format!("{key} {wave} {lower} {peak} {upper} {ap_cor}");
        match parse_table(&line, &LoadOptions::default()) {
            Ok(table) => {
                let rec = table.lookup(&key).unwrap();
                prop_assert!(rec.effective_wavelength_nm > 0.0);
                prop_assert!(rec.ci_lower <= rec.ci_peak);
                prop_assert!(rec.ci_peak <= rec.ci_upper);
            }
            Err(err) => {
                let is_invariant_violation = matches!(err, TableError::InvariantViolation { .. });
                prop_assert!(is_invariant_violation);
            }
        }
    }

    #[test]
    fn prop_keys_are_unique(
        rows in prop::collection::vec((key_strategy(), values_strategy()), 1..30)
    ) {
        let text: String = rows
            .iter()
            .map(|(key, (w, l, p, u, a))| format!("{key} {w} {l} {p} {u} {a}\n"))
            .collect();
        match parse_table(&text, &LoadOptions::default()) {
            Ok(table) => {
                let keys: Vec<&str> = table.keys().collect();
                let mut deduped = keys.clone();
                deduped.dedup();
                prop_assert_eq!(keys, deduped);
            }
            Err(err) => {
                let is_duplicate = matches!(err, TableError::DuplicateKey { .. });
                prop_assert!(is_duplicate);
            }
        }
    }
}
