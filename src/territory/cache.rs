//! Versioned on-disk cache of deoverlapped territories and BA shapes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::Column};
use tracing::info;

use crate::{common, io};
use crate::territory::polygon::{BaShape, Territory};

pub const TERRITORIES_FILE: &str = "territories.parquet";
pub const BA_SHAPES_FILE: &str = "ba_shapes.parquet";

/// Customers per m², written alongside each territory; recomputed on load.
pub const DENSITY: &str = "density";

/// Cache location for one (input version, truth-data version) pair.
/// Entries live under `<root>/<truth_data_version>/deoverlap-<digest>/`.
#[derive(Debug, Clone)]
pub struct DeoverlapCache {
    dir: PathBuf,
    key: String,
}

impl DeoverlapCache {
    pub fn new(root: &Path, input_version: &str, truth_data_version: &str) -> Self {
        let key = common::sha256_hex(format!("{input_version}\n{truth_data_version}").as_bytes());
        let dir = root.join(truth_data_version).join(format!("deoverlap-{}", &key[..16]));
        Self { dir, key }
    }

    #[inline] pub fn dir(&self) -> &Path { &self.dir }

    #[inline] pub fn key(&self) -> &str { &self.key }

    /// True when both artifacts have been published.
    pub fn is_complete(&self) -> bool {
        self.dir.join(TERRITORIES_FILE).is_file() && self.dir.join(BA_SHAPES_FILE).is_file()
    }

    /// Publish both artifacts. BA shapes are written last, so a reader that sees them
    /// also sees the territories.
    pub fn store(&self, territories: &[Territory], shapes: &[BaShape]) -> Result<()> {
        common::ensure_dir_exists(&self.dir)?;
        common::remove_stale_temps(&self.dir)?;
        io::parquet::write_parquet(&mut territories_frame(territories)?, &self.dir.join(TERRITORIES_FILE))?;
        io::parquet::write_parquet(&mut shapes_frame(shapes)?, &self.dir.join(BA_SHAPES_FILE))?;
        info!(dir = %self.dir.display(), territories = territories.len(), shapes = shapes.len(), "stored deoverlap cache");
        Ok(())
    }

    /// Load both artifacts, or `None` on a cache miss.
    pub fn load(&self) -> Result<Option<(Vec<Territory>, Vec<BaShape>)>> {
        if !self.is_complete() {
            info!(dir = %self.dir.display(), "deoverlap cache miss");
            return Ok(None);
        }
        let territories = territories_from_frame(&io::parquet::read_parquet(&self.dir.join(TERRITORIES_FILE))?)?;
        let shapes = shapes_from_frame(&io::parquet::read_parquet(&self.dir.join(BA_SHAPES_FILE))?)?;
        info!(dir = %self.dir.display(), territories = territories.len(), shapes = shapes.len(), "deoverlap cache hit");
        Ok(Some((territories, shapes)))
    }

    /// Load on a hit; otherwise run `build`, publish its output, and return it.
    pub fn get_or_build(
        &self,
        build: impl FnOnce() -> Result<(Vec<Territory>, Vec<BaShape>)>,
    ) -> Result<(Vec<Territory>, Vec<BaShape>)> {
        if let Some(cached) = self.load()? {
            return Ok(cached);
        }
        let (territories, shapes) = build()?;
        self.store(&territories, &shapes)?;
        Ok((territories, shapes))
    }
}

fn territories_frame(territories: &[Territory]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("utility_id".into(), territories.iter().map(|t| i64::from(t.utility_id)).collect::<Vec<_>>()),
        Column::new("name".into(), territories.iter().map(|t| t.name.clone()).collect::<Vec<_>>()),
        Column::new("state".into(), territories.iter().map(|t| t.state.clone()).collect::<Vec<_>>()),
        Column::new("ba_code".into(), territories.iter().map(|t| t.ba_code.clone()).collect::<Vec<_>>()),
        Column::new("customers".into(), territories.iter().map(|t| t.customers).collect::<Vec<_>>()),
        Column::new("area".into(), territories.iter().map(|t| t.area).collect::<Vec<_>>()),
        Column::new(DENSITY.into(), territories.iter().map(Territory::density).collect::<Vec<_>>()),
        Column::new("geometry".into(), territories.iter().map(|t| io::wkb::multipolygon_to_hex(&t.geometry)).collect::<Vec<_>>()),
    ])?)
}

fn shapes_frame(shapes: &[BaShape]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("state".into(), shapes.iter().map(|s| s.state.clone()).collect::<Vec<_>>()),
        Column::new("ba_code".into(), shapes.iter().map(|s| s.ba_code.clone()).collect::<Vec<_>>()),
        Column::new("geometry".into(), shapes.iter().map(|s| io::wkb::multipolygon_to_hex(&s.geometry)).collect::<Vec<_>>()),
    ])?)
}

fn territories_from_frame(df: &DataFrame) -> Result<Vec<Territory>> {
    let ids = io::parquet::f64_column(df, "utility_id")?;
    let names = io::csv::string_column(df, "name")?;
    let states = io::csv::string_column(df, "state")?;
    let bas = io::csv::string_column(df, "ba_code")?;
    let customers = io::parquet::f64_column(df, "customers")?;
    let areas = io::parquet::f64_column(df, "area")?;
    let geoms = io::csv::string_column(df, "geometry")?;

    (0..df.height())
        .map(|i| Ok(Territory {
            utility_id: ids[i] as u32,
            name: names[i].clone(),
            state: states[i].clone(),
            ba_code: bas[i].clone(),
            customers: customers[i],
            area: areas[i],
            geometry: io::wkb::multipolygon_from_hex(&geoms[i])
                .with_context(|| format!("[territory::cache] bad geometry in row {i}"))?,
        }))
        .collect()
}

fn shapes_from_frame(df: &DataFrame) -> Result<Vec<BaShape>> {
    let states = io::csv::string_column(df, "state")?;
    let bas = io::csv::string_column(df, "ba_code")?;
    let geoms = io::csv::string_column(df, "geometry")?;
    (0..df.height())
        .map(|i| Ok(BaShape {
            state: states[i].clone(),
            ba_code: bas[i].clone(),
            geometry: io::wkb::multipolygon_from_hex(&geoms[i])
                .with_context(|| format!("[territory::cache] bad geometry in row {i}"))?,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn shape() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 3.5, y: 0.0), (x: 3.5, y: 2.25), (x: 0.0, y: 0.0)]])
    }

    #[test]
    fn versions_are_namespaced() {
        let root = Path::new("/cache");
        let a = DeoverlapCache::new(root, "2023", "v1");
        let b = DeoverlapCache::new(root, "2023", "v2");
        let c = DeoverlapCache::new(root, "2024", "v1");
        assert!(a.dir().starts_with("/cache/v1"));
        assert_ne!(a.key(), b.key());
        assert_ne!(a.dir(), c.dir());
    }

    #[test]
    fn stored_artifacts_load_back() {
        let root = tempfile::tempdir().unwrap();
        let cache = DeoverlapCache::new(root.path(), "2023", "v1");
        assert!(cache.load().unwrap().is_none());

        let territories = vec![Territory {
            utility_id: 15466,
            name: "Public Service Co of Colorado".into(),
            state: "CO".into(),
            ba_code: "PSCO".into(),
            customers: 1_500_000.0,
            area: 3.9375,
            geometry: shape(),
        }];
        let shapes = vec![BaShape { state: "CO".into(), ba_code: "PSCO".into(), geometry: shape() }];
        cache.store(&territories, &shapes).unwrap();

        let stored = io::parquet::read_parquet(&cache.dir().join(TERRITORIES_FILE)).unwrap();
        let density = io::parquet::f64_column(&stored, DENSITY).unwrap();
        assert!((density[0] - 1_500_000.0 / 3.9375).abs() < 1e-6);

        let (t, s) = cache.load().unwrap().unwrap();
        assert_eq!(t, territories);
        assert_eq!(s, shapes);

        let (t, _) = cache.get_or_build(|| panic!("cache hit must not rebuild")).unwrap();
        assert_eq!(t.len(), 1);
    }
}
