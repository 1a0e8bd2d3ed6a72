use geo::{Area, BooleanOps, MultiPolygon, polygon};
use stockgap::territory::{self, CustomerRow, CustomerTable, DeoverlapCache, RawTerritory, StateBoundary};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)]])
}

fn raw(id: &str, geometry: MultiPolygon<f64>) -> RawTerritory {
    RawTerritory {
        utility_id: id.into(),
        name: format!("Utility {id}"),
        state: String::new(),
        geometry,
    }
}

fn inputs() -> (Vec<RawTerritory>, Vec<StateBoundary>, CustomerTable) {
    let territories = vec![
        raw("1", rect(0.0, 0.0, 30.0, 10.0)),
        raw("2", rect(2.0, 2.0, 8.0, 8.0)),
        raw("n/a", rect(0.0, 0.0, 5.0, 5.0)),
        raw("7", rect(50.0, 50.0, 60.0, 60.0)),
    ];
    let states = vec![
        StateBoundary { state: "CO".into(), geometry: rect(0.0, 0.0, 20.0, 10.0) },
        StateBoundary { state: "WY".into(), geometry: rect(20.0, 0.0, 40.0, 10.0) },
    ];
    let row = |id, state: &str, ba: &str, customers| CustomerRow {
        utility_id: id, state: state.into(), ba_code: Some(ba.into()), customers,
    };
    let customers = CustomerTable::from_rows([
        row(1, "CO", "PSCO", 100.0),
        row(1, "WY", "WACM", 40.0),
        row(2, "CO", "PSCO", 50.0),
    ]);
    (territories, states, customers)
}

#[test]
fn deoverlap_pipeline_splits_trims_and_dissolves() {
    let (raw, states, customers) = inputs();
    let result = territory::run(raw, &states, &customers, None).unwrap();

    assert_eq!(result.report.bad_ids, 1);
    assert_eq!(result.report.outside_states, 1);
    assert_eq!(result.territories.len(), 3);

    let area_of = |id: u32, state: &str| result.territories.iter()
        .find(|t| t.utility_id == id && t.state == state)
        .map(|t| t.area)
        .unwrap();
    assert!((area_of(1, "CO") - 164.0).abs() < 1e-6);
    assert!((area_of(1, "WY") - 100.0).abs() < 1e-6);
    assert!((area_of(2, "CO") - 36.0).abs() < 1e-6);

    let psco = result.territories.iter().find(|t| t.utility_id == 2).unwrap();
    assert!((psco.density() - 50.0 / 36.0).abs() < 1e-9);

    for a in &result.territories {
        for b in &result.territories {
            if a.utility_id != b.utility_id && a.state == b.state {
                assert!(a.geometry.intersection(&b.geometry).unsigned_area() < 1e-3);
            }
        }
    }

    let shape_area = |ba: &str| result.ba_shapes.iter().find(|s| s.ba_code == ba).map(|s| s.geometry.unsigned_area()).unwrap();
    assert_eq!(result.ba_shapes.len(), 2);
    assert!((shape_area("PSCO") - 200.0).abs() < 1e-6);
    assert!((shape_area("WACM") - 100.0).abs() < 1e-6);
}

#[test]
fn cached_output_is_reused_per_version() {
    let root = tempfile::tempdir().unwrap();
    let cache = DeoverlapCache::new(root.path(), "2023", "v01");
    assert!(!cache.is_complete());

    let (first_t, first_s) = cache.get_or_build(|| {
        let (raw, states, customers) = inputs();
        let result = territory::run(raw, &states, &customers, None)?;
        Ok((result.territories, result.ba_shapes))
    }).unwrap();
    assert!(cache.is_complete());

    let (again_t, again_s) = cache.get_or_build(|| anyhow::bail!("cache should have been hit")).unwrap();
    assert_eq!(again_t.len(), first_t.len());
    assert_eq!(again_s.len(), first_s.len());
    for (a, b) in again_t.iter().zip(&first_t) {
        assert_eq!(a.utility_id, b.utility_id);
        assert_eq!(a.ba_code, b.ba_code);
        assert!((a.area - b.area).abs() < 1e-9);
    }

    let other = DeoverlapCache::new(root.path(), "2023", "v02");
    assert_ne!(other.dir(), cache.dir());
    assert!(!other.is_complete());
}
