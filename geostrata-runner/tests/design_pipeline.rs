//! Design file → evaluation → artifacts, end to end.

use proptest::prelude::*;

use geostrata_core::{Geo, GeoAssignment, GeoStrata, GroupId, GroupRatios, StratumId};
use geostrata_runner::{
    evaluate_config, evaluate_design, evaluate_design_serial, load_report, save_artifacts,
    DesignConfig,
};

const TEN_GEOS: &str = r#"
n_groups = 2

[[geos]]
id = "1"
volume = 100.0

[[geos]]
id = "2"
volume = 90.0
group = 0

[[geos]]
id = "3"
volume = 80.0

[[geos]]
id = "4"
volume = 70.0

[[geos]]
id = "5"
volume = 60.0

[[geos]]
id = "6"
volume = 50.0

[[geos]]
id = "7"
volume = 40.0

[[geos]]
id = "8"
volume = 30.0

[[geos]]
id = "9"
volume = 20.0

[[geos]]
id = "10"
volume = 10.0
"#;

#[test]
fn ten_geo_design_file() {
    let config = DesignConfig::from_toml(TEN_GEOS).unwrap();
    let (design, report) = evaluate_config(&config).unwrap();

    let strata: Vec<u32> = design.strata().iter().map(|s| s.0).collect();
    assert_eq!(strata, vec![1, 0, 1, 2, 2, 3, 3, 4, 4, 5]);

    assert_eq!(report.strata.len(), 5);
    assert_eq!(report.n_excluded, 1);
    assert!((report.total_log_randomizations.log() - 5.0 * 2f64.ln()).abs() < 1e-9);
    assert_eq!(report.fingerprint, Some(config.fingerprint().unwrap()));
    assert!(!report.is_fixed);
}

#[test]
fn artifacts_round_trip() {
    let config = DesignConfig::from_toml(TEN_GEOS).unwrap();
    let (design, report) = evaluate_config(&config).unwrap();

    let temp_dir = tempfile::tempdir().unwrap();
    let dir = save_artifacts(&report, &design, temp_dir.path()).unwrap();
    assert!(dir.join("report.json").exists());
    assert!(dir.join("strata.csv").exists());
    assert!(dir.join("counts.csv").exists());

    let loaded = load_report(&dir).unwrap();
    assert_eq!(loaded.fingerprint, report.fingerprint);
    assert_eq!(loaded.strata.len(), report.strata.len());
    assert_eq!(loaded.capacity_exceeded, report.capacity_exceeded);
    assert!(
        (loaded.total_log_randomizations.log() - report.total_log_randomizations.log()).abs()
            < 1e-12
    );

    let strata_csv = std::fs::read_to_string(dir.join("strata.csv")).unwrap();
    assert_eq!(strata_csv.lines().count(), 11);
}

#[test]
fn fully_fixed_file_is_detected() {
    let config = DesignConfig::from_toml(
        r#"
        n_groups = 2
        group_ratios = [1, 1]

        [[geos]]
        id = "a"
        group = 1

        [[geos]]
        id = "b"
        group = 2
        "#,
    )
    .unwrap();
    let (_, report) = evaluate_config(&config).unwrap();
    assert!(report.is_fixed);
    assert_eq!(report.strata[0].stratum, StratumId(1));
    assert_eq!(report.total_log_randomizations.log(), 0.0);
}

#[test]
fn invalid_groups_in_file_fail() {
    let config = DesignConfig::from_toml(
        r#"
        n_groups = 2

        [[geos]]
        id = "a"
        group = 5

        [[geos]]
        id = "b"
        group = 3
        "#,
    )
    .unwrap();
    let err = evaluate_config(&config).unwrap_err();
    assert!(err.to_string().contains("[3, 5]"), "{err}");
}

// ── Parallel evaluation is order-independent ─────────────────────────

fn arb_design() -> impl Strategy<Value = GeoStrata> {
    (prop::collection::vec(1u32..3, 2..4), 4usize..40).prop_flat_map(|(ratios, n)| {
        let n_groups = ratios.len() as u32;
        let entry = prop_oneof![
            4 => Just(GeoAssignment::Free),
            1 => Just(GeoAssignment::Excluded),
            2 => (1..=n_groups).prop_map(|g| GeoAssignment::FixedTo(GroupId(g))),
        ];
        prop::collection::vec(entry, n).prop_map(move |assignments| {
            let geos = (0..assignments.len())
                .map(|i| Geo::new(format!("g{i}"), i as f64))
                .collect();
            let ratios = GroupRatios::new(ratios.clone()).unwrap();
            let n_groups = ratios.n_groups();
            GeoStrata::new(geos, assignments, n_groups, Some(ratios)).unwrap()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn parallel_and_serial_reports_agree(design in arb_design()) {
        let parallel = evaluate_design(&design).unwrap();
        let serial = evaluate_design_serial(&design).unwrap();
        prop_assert_eq!(parallel, serial);
    }

    #[test]
    fn report_agrees_with_core_counts(design in arb_design()) {
        let report = evaluate_design(&design).unwrap();
        let counts = design.count_randomizations().unwrap();
        prop_assert_eq!(report.strata.len(), counts.counts.len());
        for (row, (id, count)) in report.strata.iter().zip(&counts.counts) {
            prop_assert_eq!(row.stratum, *id);
            prop_assert_eq!(row.log_count, *count);
        }
        prop_assert_eq!(report.is_fixed, design.is_fixed().unwrap());
        prop_assert_eq!(report.capacity_exceeded, counts.capacity_exceeded);
    }
}
