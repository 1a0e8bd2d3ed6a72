use ahash::AHashMap;
use chrono::{Datelike, Duration, NaiveDate};
use stockgap::profile::{
    allocate, county_gap, hourly_index, read_demand_dir, AllocationWeights, ProfileSet, SectorProfiles, HOURS,
};
use stockgap::RunConfig;

fn flat(value: f64) -> Vec<f64> { vec![value; HOURS] }

fn set(columns: &[(&str, Vec<f64>)]) -> ProfileSet {
    let mut set = ProfileSet::new();
    for (name, values) in columns {
        set.insert(name, values.clone()).unwrap();
    }
    set
}

fn weights(rows: &[(&str, &str, f64)]) -> AllocationWeights {
    AllocationWeights::from_amounts(rows.iter().map(|(b, c, w)| (b.to_string(), c.to_string(), *w))).unwrap()
}

#[test]
fn gap_splits_by_county_weight() {
    let gap = set(&[("X", flat(1000.0))]);
    let counties = allocate(&gap, &weights(&[("X", "C1", 0.7), ("X", "C2", 0.3)])).unwrap();
    assert!((counties.get("C1").unwrap()[0] - 700.0).abs() < 1e-9);
    assert!((counties.get("C2").unwrap()[0] - 300.0).abs() < 1e-9);
    assert!((counties.hourly_total()[0] - 1000.0).abs() < 1e-9);
}

#[test]
fn trimmed_negative_gap_allocates_zero() {
    let sectors = SectorProfiles {
        total: set(&[("X", flat(500.0))]),
        residential: set(&[("X", flat(200.0))]),
        commercial: set(&[("X", flat(200.0))]),
        industrial: set(&[("X", flat(150.0))]),
    };
    let gap = sectors.gap(true).unwrap();
    assert_eq!(gap.get("X").unwrap()[7], 0.0);
    let counties = allocate(&gap, &weights(&[("X", "C1", 1.0), ("X", "C2", 3.0)])).unwrap();
    assert!(counties.iter().all(|(_, v)| v.iter().all(|g| *g >= 0.0)));
    assert_eq!(counties.hourly_total()[7], 0.0);
}

#[test]
fn allocation_conserves_every_hour() {
    let shape = |scale: f64| (0..HOURS).map(|h| scale * (1.0 + (h % 24) as f64) - 30.0).collect::<Vec<_>>();
    let gap = set(&[("A", shape(3.0)), ("B", shape(11.0)), ("C", shape(0.5))]);
    let w = weights(&[
        ("A", "K1", 0.2), ("A", "K2", 0.5), ("A", "K3", 0.3),
        ("B", "K2", 1.0), ("B", "K4", 2.0),
        ("C", "K1", 5.0),
    ]);
    let counties = allocate(&gap, &w).unwrap();
    for (c, g) in counties.hourly_total().iter().zip(gap.hourly_total()) {
        assert!((c - g).abs() <= 1e-6 * g.abs().max(1.0), "{c} vs {g}");
    }
}

#[test]
fn leap_year_index_drops_feb_29() {
    for year in [2019, 2020] {
        let index = hourly_index(year).unwrap();
        assert_eq!(index.len(), HOURS);
        assert!(!index.iter().any(|t| t.month() == 2 && t.day() == 29));
    }
}

#[test]
fn demand_files_to_county_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let demand = dir.path().join("demand");
    std::fs::create_dir(&demand).unwrap();

    // UTC-7: local 2019-01-01 00:00 is 07:00 UTC.
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap().and_hms_opt(7, 0, 0).unwrap();
    let mut text = String::from("timestamp,mw\n");
    for h in 0..HOURS as i64 {
        let t = start + Duration::hours(h);
        text.push_str(&format!("{},{}\n", t.format("%Y-%m-%d %H:%M:%S"), 100 + h % 24));
    }
    std::fs::write(demand.join("PSCO.csv"), text).unwrap();

    let offsets = AHashMap::from_iter([("PSCO".to_string(), -7)]);
    let total = read_demand_dir(&demand, &offsets, 2019).unwrap();
    assert_eq!(total.get("PSCO").unwrap()[0], 100.0);
    assert_eq!(total.get("PSCO").unwrap()[23], 123.0);

    let sectors = SectorProfiles {
        total,
        residential: set(&[("PSCO", flat(40.0)), ("CISO", flat(1.0))]),
        commercial: set(&[("PSCO", flat(30.0))]),
        industrial: set(&[("PSCO", flat(20.0))]),
    };
    let gap = sectors.gap(false).unwrap();
    assert_eq!(gap.names().collect::<Vec<_>>(), vec!["PSCO"]);
    assert_eq!(gap.get("PSCO").unwrap()[0], 10.0);

    let counties = allocate(&gap, &weights(&[("PSCO", "G0800010", 1.0), ("PSCO", "G0800310", 1.0)])).unwrap();
    let path = dir.path().join("gap.parquet");
    counties.write_parquet(&path, 2019).unwrap();
    let back = ProfileSet::read_parquet(&path).unwrap();
    assert_eq!(back, counties);
    assert_eq!(back.get("G0800010").unwrap()[0], 5.0);
}

#[test]
fn missing_utc_offset_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ERCO.csv"), "timestamp,mw\n2019-01-01 06:00:00,1\n").unwrap();
    let err = read_demand_dir(dir.path(), &AHashMap::new(), 2019).unwrap_err();
    assert!(format!("{err:#}").contains("ERCO"));
}

#[test]
fn gap_section_of_run_config_drives_trimming() {
    let base = r#"
        truth_data_version = "v01"

        [sampling]
        seed = 0
        samples = 10
        generations = [["building_type"]]
        tsv_version = "2024-v1"
        year = 2019
    "#;
    let overshoot = || SectorProfiles {
        total: set(&[("X", flat(500.0))]),
        residential: set(&[("X", flat(200.0))]),
        commercial: set(&[("X", flat(200.0))]),
        industrial: set(&[("X", flat(150.0))]),
    };
    let w = weights(&[("X", "C1", 1.0)]);

    let kept = RunConfig::from_toml_str(&format!("{base}\n[gap]\ntrim_negative_gap = false\n")).unwrap();
    assert_eq!(county_gap(overshoot(), &w, &kept.gap).unwrap().get("C1").unwrap()[0], -50.0);

    let trimmed = RunConfig::from_toml_str(&format!("{base}\n[gap]\ntrim_negative_gap = true\n")).unwrap();
    assert_eq!(county_gap(overshoot(), &w, &trimmed.gap).unwrap().get("C1").unwrap()[0], 0.0);
}
