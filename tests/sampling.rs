use stockgap::config::{SamplingConfig, Sizing};
use stockgap::sampling::{resolve, STOCK_FILE};
use stockgap::{DistributionStore, StagedSampler, StockError};

fn store() -> DistributionStore {
    let mut store = DistributionStore::new();
    store.load_tsv_bytes("fuel", b"Option=A\tOption=B\tOption=C\n0.25\t0.25\t0.5\n").unwrap();
    store.load_tsv_bytes("building_type", b"Option=Office\tOption=Retail\tOption=Warehouse\n0.5\t0.3\t0.2\n").unwrap();
    store.load_tsv_bytes("vintage",
        b"Dependency=building_type\tOption=Pre1980\tOption=1980+\n\
          Office\t0.4\t0.6\n\
          Retail\t0.1\t0.9\n\
          Warehouse\t1\t0\n").unwrap();
    store.load_tsv_bytes("size",
        b"Dependency=building_type\tDependency=vintage\tOption=Small\tOption=Large\n\
          Office\tPre1980\t1\t0\n\
          Office\t1980+\t0\t1\n\
          Retail\tPre1980\t0.5\t0.5\n\
          Retail\t1980+\t0.5\t0.5\n\
          Warehouse\tPre1980\t0.2\t0.8\n\
          Warehouse\t1980+\t0.2\t0.8\n").unwrap();
    store
}

fn config(generations: &[&[&str]], samples: usize, seed: u64) -> SamplingConfig {
    SamplingConfig {
        seed,
        samples,
        jitter: true,
        generations: generations.iter().map(|g| g.iter().map(|s| s.to_string()).collect()).collect(),
        tsv_version: "2024-v1".into(),
        year: 2018,
        sizing: Sizing::Autosize,
    }
}

#[test]
fn unjittered_sampler_pins_sobol_sequence() {
    let store = store();
    let mut cfg = config(&[&["fuel"]], 4, 0);
    cfg.jitter = false;
    let stock = StagedSampler::new(&store, &cfg, "v01").unwrap().sample().unwrap();
    assert_eq!(stock.column("fuel").unwrap(), &["A", "C", "C", "B"]);
}

#[test]
fn identical_runs_write_identical_stock() {
    let store = store();
    let cfg = config(&[&["building_type"], &["size", "vintage"], &["fuel"]], 64, 0);
    let sampler = StagedSampler::new(&store, &cfg, "v01").unwrap();

    let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
    sampler.run(a.path()).unwrap();
    sampler.run(b.path()).unwrap();
    assert_eq!(
        std::fs::read(a.path().join(STOCK_FILE)).unwrap(),
        std::fs::read(b.path().join(STOCK_FILE)).unwrap(),
    );

    let text = std::fs::read_to_string(a.path().join(STOCK_FILE)).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("Building,"));
    assert!(lines.next().unwrap().starts_with("1,"));
}

#[test]
fn staging_preserves_rows_and_dependency_closure() {
    let store = store();
    let cfg = config(&[&["building_type"], &["size", "vintage"]], 50, 11);
    let stock = StagedSampler::new(&store, &cfg, "v01").unwrap().sample().unwrap();
    assert_eq!(stock.len(), 50);
    for i in 0..stock.len() {
        let building_type = stock.value(i, "building_type").unwrap();
        let vintage = stock.value(i, "vintage").unwrap();
        let size = stock.value(i, "size").unwrap();
        if building_type == "Warehouse" { assert_eq!(vintage, "Pre1980") }
        if building_type == "Office" {
            assert_eq!(size, if vintage == "Pre1980" { "Small" } else { "Large" });
        }
    }
}

#[test]
fn dependency_resolution_orders_and_respects_preassigned() {
    let graph = std::collections::HashMap::from([
        ("a", Vec::<String>::new()),
        ("b", vec!["a".to_string()]),
        ("c", vec!["a".to_string(), "b".to_string()]),
    ]);
    let deps = |name: &str| graph.get(name).map(Vec::as_slice)
        .ok_or_else(|| StockError::UnresolvableDependencies { remaining: vec![name.to_string()] });
    assert_eq!(resolve(&["a", "b", "c"], &[], deps).unwrap(), vec!["a", "b", "c"]);
    assert_eq!(resolve(&["a", "c"], &["b"], deps).unwrap(), vec!["a", "c"]);
}

#[test]
fn loaded_tables_sum_to_one_or_are_rejected() {
    let store = store();
    for name in store.names() {
        let table = store.get(name).unwrap();
        for (_, probs) in table.rows() {
            assert!((probs.iter().sum::<f64>() - 1.0).abs() <= 1e-6);
        }
    }
    let mut bad = DistributionStore::new();
    let err = bad.load_tsv_bytes("fuel", b"Option=A\tOption=B\n0.5\t0.4\n").unwrap_err();
    assert!(matches!(err, StockError::MalformedDistribution { .. }));
}

#[test]
fn tsv_directory_loads_into_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fuel.tsv"), "Option=A\tOption=B\n0.5\t0.5\n").unwrap();
    std::fs::write(dir.path().join("vintage.json"), r#"{"options": ["Old", "New"], "tree": {"Option=Old": 0.25, "Option=New": 0.75}}"#).unwrap();
    let store = DistributionStore::load_dir(dir.path()).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.lookup("vintage", &[]).unwrap(), &[0.25, 0.75]);
}

#[test]
fn seeded_jitter_pins_offsets_and_draws() {
    let store = store();
    let cfg = config(&[&["building_type"], &["fuel"]], 4, 0);
    let sampler = StagedSampler::new(&store, &cfg, "v01").unwrap();

    let offsets = sampler.offsets();
    assert_eq!(offsets.len(), 2);
    assert!((offsets[0][0] - 0.7311134158637046).abs() < 1e-15);
    assert!((offsets[1][0] - 0.7734601843532382).abs() < 1e-15);

    let stock = sampler.sample().unwrap();
    assert_eq!(stock.column("building_type").unwrap(), &["Retail", "Office", "Office", "Warehouse"]);
    assert_eq!(stock.column("fuel").unwrap(), &["C", "B", "C", "A"]);
}
