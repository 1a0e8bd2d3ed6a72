//! Reprojection of lon/lat geometry into a CONUS equal-area CRS.

use geo::{Coord, MapCoords, MultiPolygon, Point};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::error::{StockError, StockResult};

/// NAD83 geographic coordinates.
pub const NAD83: &str = "+proj=longlat +datum=NAD83 +no_defs +type=crs";

/// NAD83 / Conus Albers (EPSG:5070), metres.
pub const CONUS_ALBERS: &str =
    "+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +datum=NAD83 +units=m +no_defs +type=crs";

/// Lon/lat (degrees) to equal-area metres.
pub struct EqualArea {
    from: Proj4,
    to: Proj4,
}

impl std::fmt::Debug for EqualArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EqualArea(NAD83 -> EPSG:5070)")
    }
}

impl EqualArea {
    pub fn new() -> StockResult<Self> {
        let build = |proj_string: &str| Proj4::from_proj_string(proj_string)
            .map_err(|e| StockError::Geometry(format!("failed to build PROJ.4 {proj_string}: {e:?}")));
        Ok(Self { from: build(NAD83)?, to: build(CONUS_ALBERS)? })
    }

    pub fn coord(&self, coord: Coord<f64>) -> StockResult<Coord<f64>> {
        // Radians in, metres out.
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| StockError::Geometry(format!("CRS transform failed at ({}, {}): {e:?}", coord.x, coord.y)))?;
        Ok(Coord { x: point.0, y: point.1 })
    }

    pub fn multipolygon(&self, shape: &MultiPolygon<f64>) -> StockResult<MultiPolygon<f64>> {
        shape.try_map_coords(|coord| self.coord(coord))
    }

    pub fn point(&self, point: Point<f64>) -> StockResult<Point<f64>> {
        Ok(Point(self.coord(point.0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_of_the_projection_maps_to_zero() {
        let projector = EqualArea::new().unwrap();
        let c = projector.coord(Coord { x: -96.0, y: 23.0 }).unwrap();
        assert!(c.x.abs() < 1e-6 && c.y.abs() < 1e-6, "{c:?}");
    }

    #[test]
    fn one_degree_cell_has_plausible_area() {
        use geo::{polygon, Area};
        let projector = EqualArea::new().unwrap();
        let cell = MultiPolygon(vec![polygon![
            (x: -100.0, y: 40.0), (x: -99.0, y: 40.0), (x: -99.0, y: 41.0), (x: -100.0, y: 41.0), (x: -100.0, y: 40.0),
        ]]);
        let area = projector.multipolygon(&cell).unwrap().unsigned_area();
        // About 85 km by 111 km.
        assert!((9.0e9..10.0e9).contains(&area), "{area}");
    }
}
