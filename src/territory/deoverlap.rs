//! Cleaning and disjoining of overlapping utility territories.

use std::collections::BTreeMap;

use ahash::AHashMap;
use geo::{Area, BooleanOps, Buffer, Intersects, MultiPolygon, Polygon};
use rstar::RTree;
use tracing::{debug, info, warn};

use crate::error::StockResult;
use crate::io::wkb;
use crate::territory::customers::CustomerTable;
use crate::territory::polygon::{envelope_of, BaShape, BoundingBox, RawTerritory, StateBoundary, Territory};
use crate::territory::project::EqualArea;

/// Negative buffer distance (projected units) under which a part counts as a sliver.
pub const SLIVER_BUFFER: f64 = 1e-3;

/// What each pipeline stage removed or changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeoverlapReport {
    pub input: usize,
    pub outside_states: usize,
    pub state_pieces: usize,
    pub bad_ids: usize,
    pub no_customers: usize,
    pub no_ba: usize,
    pub sliver_parts: usize,
    pub sliver_territories: usize,
    pub duplicates: usize,
    pub trimmed: usize,
    pub emptied: usize,
    pub discarded_parts: usize,
    pub output: usize,
    pub ba_shapes: usize,
}

/// Result of the full pipeline.
#[derive(Debug, Clone)]
pub struct Deoverlapped {
    pub territories: Vec<Territory>,
    pub ba_shapes: Vec<BaShape>,
    pub report: DeoverlapReport,
}

/// Split every territory along state boundaries; each piece takes the state it falls in.
/// Returns the pieces and the ids of territories that overlap no state.
pub fn split_by_state(raw: Vec<RawTerritory>, states: &[StateBoundary]) -> (Vec<RawTerritory>, Vec<String>) {
    let rtree = RTree::bulk_load(BoundingBox::of_all(states.iter().map(|s| &s.geometry)));
    let mut pieces = Vec::with_capacity(raw.len());
    let mut outside = Vec::new();
    for territory in raw {
        let before = pieces.len();
        if let Some(envelope) = envelope_of(&territory.geometry) {
            let mut hits = rtree.locate_in_envelope_intersecting(&envelope).map(BoundingBox::idx).collect::<Vec<_>>();
            hits.sort_unstable();
            for s in hits {
                let state = &states[s];
                if !state.geometry.intersects(&territory.geometry) { continue }
                let piece = territory.geometry.intersection(&state.geometry);
                if piece.unsigned_area() <= 0.0 { continue }
                pieces.push(RawTerritory { state: state.state.clone(), geometry: piece, ..territory.clone() });
            }
        }
        if pieces.len() == before {
            outside.push(territory.utility_id);
        }
    }
    (pieces, outside)
}

/// Keep pieces with an integer id, a customer total and a BA code; project and measure them.
pub fn attach_customers(
    pieces: Vec<RawTerritory>,
    customers: &CustomerTable,
    projector: Option<&EqualArea>,
    report: &mut DeoverlapReport,
) -> StockResult<Vec<Territory>> {
    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let Ok(utility_id) = piece.utility_id.trim().parse::<u32>() else {
            report.bad_ids += 1;
            continue;
        };
        let Some(total) = customers.customers(utility_id, &piece.state) else {
            report.no_customers += 1;
            continue;
        };
        let Some(ba_code) = customers.ba_code(utility_id, &piece.state) else {
            report.no_ba += 1;
            continue;
        };
        let geometry = match projector {
            Some(p) => p.multipolygon(&piece.geometry)?,
            None => piece.geometry,
        };
        out.push(Territory {
            utility_id,
            name: piece.name,
            state: piece.state,
            ba_code: ba_code.to_string(),
            customers: total,
            area: geometry.unsigned_area(),
            geometry,
        });
    }
    Ok(out)
}

/// Drop parts that vanish under a negative buffer. Returns (kept, parts dropped, territories emptied).
pub fn remove_slivers(territories: Vec<Territory>, tolerance: f64) -> (Vec<Territory>, usize, usize) {
    let mut parts_dropped = 0;
    let mut emptied = 0;
    let kept = territories.into_iter()
        .filter_map(|mut t| {
            let before = t.geometry.0.len();
            let parts = t.geometry.0.into_iter()
                .filter(|p| p.buffer(-tolerance).unsigned_area() > 0.0)
                .collect::<Vec<Polygon<f64>>>();
            parts_dropped += before - parts.len();
            if parts.is_empty() {
                emptied += 1;
                return None;
            }
            t.geometry = MultiPolygon(parts);
            t.area = t.geometry.unsigned_area();
            Some(t)
        })
        .collect();
    (kept, parts_dropped, emptied)
}

/// Collapse byte-identical geometries, keeping the row with the most customers
/// (the earliest on ties). Input order is otherwise preserved.
pub fn remove_duplicates(territories: Vec<Territory>) -> (Vec<Territory>, usize) {
    let mut best = AHashMap::<Vec<u8>, usize>::new();
    for (i, t) in territories.iter().enumerate() {
        best.entry(wkb::multipolygon_to_wkb(&t.geometry))
            .and_modify(|j| if t.customers > territories[*j].customers { *j = i })
            .or_insert(i);
    }
    let mut keep = best.into_values().collect::<Vec<_>>();
    keep.sort_unstable();
    let removed = territories.len() - keep.len();

    let mut slots = territories.into_iter().map(Some).collect::<Vec<_>>();
    (keep.into_iter().filter_map(|i| slots[i].take()).collect(), removed)
}

/// Within each state, subtract from every territory the union of all smaller,
/// different-utility territories it intersects. Sorting is by area descending
/// with ties by utility id ascending; subtraction uses the unmodified shapes, so
/// the result does not depend on processing order. Returns (territories, trimmed, emptied).
pub fn remove_overlaps(territories: Vec<Territory>) -> (Vec<Territory>, usize, usize) {
    let mut by_state = BTreeMap::<String, Vec<Territory>>::new();
    for t in territories {
        by_state.entry(t.state.clone()).or_default().push(t);
    }

    let mut out = Vec::new();
    let mut trimmed = 0;
    let mut emptied = 0;
    for (state, mut group) in by_state {
        group.sort_by(|a, b| b.area.total_cmp(&a.area).then(a.utility_id.cmp(&b.utility_id)));
        let rtree = RTree::bulk_load(BoundingBox::of_all(group.iter().map(|t| &t.geometry)));

        let mut results = Vec::with_capacity(group.len());
        for (rank, t) in group.iter().enumerate() {
            let Some(envelope) = envelope_of(&t.geometry) else { continue };
            let mut smaller = rtree.locate_in_envelope_intersecting(&envelope)
                .map(BoundingBox::idx)
                .filter(|&j| j > rank && group[j].utility_id != t.utility_id)
                .filter(|&j| group[j].geometry.intersects(&t.geometry))
                .collect::<Vec<_>>();
            smaller.sort_unstable();

            let geometry = match smaller.iter().map(|&j| group[j].geometry.clone()).reduce(|a, b| a.union(&b)) {
                Some(cover) => {
                    trimmed += 1;
                    t.geometry.difference(&cover)
                }
                None => t.geometry.clone(),
            };
            results.push(geometry);
        }

        debug!(state = %state, territories = group.len(), "removed overlaps");
        for (mut t, geometry) in group.into_iter().zip(results) {
            let area = geometry.unsigned_area();
            if area <= 0.0 {
                emptied += 1;
                continue;
            }
            t.geometry = geometry;
            t.area = area;
            out.push(t);
        }
    }
    (out, trimmed, emptied)
}

/// Drop degenerate (zero-area) parts left by boolean operations.
/// Returns the polygonal remainder and how many parts were discarded.
pub fn clean_polygonal(geometry: MultiPolygon<f64>) -> (MultiPolygon<f64>, usize) {
    let before = geometry.0.len();
    let parts = geometry.0.into_iter()
        .filter(|p| p.exterior().0.len() >= 4 && p.unsigned_area() > 0.0)
        .collect::<Vec<_>>();
    let discarded = before - parts.len();
    (MultiPolygon(parts), discarded)
}

/// Union territories sharing (state, BA code). Returns shapes sorted by key and the
/// number of degenerate parts discarded.
pub fn dissolve(territories: &[Territory]) -> (Vec<BaShape>, usize) {
    let mut groups = BTreeMap::<(String, String), Vec<&MultiPolygon<f64>>>::new();
    for t in territories {
        groups.entry((t.state.clone(), t.ba_code.clone())).or_default().push(&t.geometry);
    }

    let mut discarded = 0;
    let shapes = groups.into_iter()
        .filter_map(|((state, ba_code), geoms)| {
            let merged = geoms.into_iter().cloned().reduce(|a, b| a.union(&b))?;
            let (geometry, dropped) = clean_polygonal(merged);
            discarded += dropped;
            (!geometry.0.is_empty()).then_some(BaShape { state, ba_code, geometry })
        })
        .collect();
    (shapes, discarded)
}

/// Run every stage in order. `projector` is `None` when the input is already in an
/// equal-area CRS.
pub fn run(
    raw: Vec<RawTerritory>,
    states: &[StateBoundary],
    customers: &CustomerTable,
    projector: Option<&EqualArea>,
) -> StockResult<Deoverlapped> {
    let mut report = DeoverlapReport { input: raw.len(), ..Default::default() };

    let (pieces, outside) = split_by_state(raw, states);
    if !outside.is_empty() {
        warn!(count = outside.len(), ids = ?outside, "dropping territories outside every state");
    }
    report.outside_states = outside.len();
    report.state_pieces = pieces.len();

    let territories = attach_customers(pieces, customers, projector, &mut report)?;

    let (territories, sliver_parts, sliver_territories) = remove_slivers(territories, SLIVER_BUFFER);
    report.sliver_parts = sliver_parts;
    report.sliver_territories = sliver_territories;

    let (territories, duplicates) = remove_duplicates(territories);
    report.duplicates = duplicates;

    let (territories, trimmed, emptied) = remove_overlaps(territories);
    report.trimmed = trimmed;
    report.emptied = emptied;

    let (ba_shapes, discarded) = dissolve(&territories);
    report.discarded_parts = discarded;
    report.output = territories.len();
    report.ba_shapes = ba_shapes.len();

    info!(?report, "deoverlap complete");
    Ok(Deoverlapped { territories, ba_shapes, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + side, y: y0), (x: x0 + side, y: y0 + side), (x: x0, y: y0 + side), (x: x0, y: y0),
        ]])
    }

    fn territory(id: u32, state: &str, ba: &str, customers: f64, geometry: MultiPolygon<f64>) -> Territory {
        Territory {
            utility_id: id,
            name: format!("U{id}"),
            state: state.into(),
            ba_code: ba.into(),
            customers,
            area: geometry.unsigned_area(),
            geometry,
        }
    }

    #[test]
    fn nested_square_is_cut_out_of_the_larger() {
        let p1 = territory(1, "CO", "PSCO", 100.0, square(0.0, 0.0, 10.0));
        let p2 = territory(2, "CO", "PSCO", 50.0, square(2.0, 2.0, 6.0));
        let (out, trimmed, emptied) = remove_overlaps(vec![p2, p1]);
        assert_eq!((trimmed, emptied), (1, 0));

        let big = out.iter().find(|t| t.utility_id == 1).unwrap();
        let small = out.iter().find(|t| t.utility_id == 2).unwrap();
        assert!((big.area - 64.0).abs() < 1e-9);
        assert!((small.area - 36.0).abs() < 1e-9);
        assert!(big.geometry.intersection(&small.geometry).unsigned_area() < 1e-3);
    }

    #[test]
    fn same_utility_and_other_states_are_left_alone() {
        let p1 = territory(1, "CO", "PSCO", 100.0, square(0.0, 0.0, 10.0));
        let p2 = territory(1, "CO", "PSCO", 50.0, square(2.0, 2.0, 6.0));
        let p3 = territory(3, "WY", "WACM", 50.0, square(2.0, 2.0, 6.0));
        let (out, trimmed, _) = remove_overlaps(vec![p1, p2, p3]);
        assert_eq!(trimmed, 0);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn pairwise_disjoint_after_chain_of_containment() {
        let ts = vec![
            territory(1, "CO", "A", 1.0, square(0.0, 0.0, 10.0)),
            territory(2, "CO", "A", 1.0, square(1.0, 1.0, 8.0)),
            territory(3, "CO", "B", 1.0, square(2.0, 2.0, 3.0)),
            territory(4, "CO", "B", 1.0, square(8.0, 8.0, 4.0)),
        ];
        let (out, _, _) = remove_overlaps(ts);
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                let overlap = out[i].geometry.intersection(&out[j].geometry).unsigned_area();
                assert!(overlap < 1e-3, "{} vs {}: {overlap}", out[i].utility_id, out[j].utility_id);
            }
        }
        let total = out.iter().map(|t| t.area).sum::<f64>();
        let union = out.iter().map(|t| t.geometry.clone()).reduce(|a, b| a.union(&b)).unwrap().unsigned_area();
        assert!((total - union).abs() < 1e-6);
    }

    #[test]
    fn equal_areas_break_ties_by_utility_id() {
        let a = territory(7, "CO", "A", 1.0, square(0.0, 0.0, 4.0));
        let b = territory(3, "CO", "A", 1.0, square(2.0, 0.0, 4.0));
        let (out, _, _) = remove_overlaps(vec![a, b]);
        // Utility 3 sorts first and loses the shared strip to utility 7.
        let three = out.iter().find(|t| t.utility_id == 3).unwrap();
        let seven = out.iter().find(|t| t.utility_id == 7).unwrap();
        assert!((three.area - 8.0).abs() < 1e-9);
        assert!((seven.area - 16.0).abs() < 1e-9);
    }

    #[test]
    fn slivers_vanish_under_negative_buffer() {
        let thin = MultiPolygon(vec![
            square(0.0, 0.0, 10.0).0.remove(0),
            polygon![(x: 20.0, y: 0.0), (x: 30.0, y: 0.0), (x: 30.0, y: 0.0005), (x: 20.0, y: 0.0005), (x: 20.0, y: 0.0)],
        ]);
        let only_sliver = MultiPolygon(vec![
            polygon![(x: 40.0, y: 0.0), (x: 50.0, y: 0.0), (x: 50.0, y: 0.001), (x: 40.0, y: 0.001), (x: 40.0, y: 0.0)],
        ]);
        let (out, parts, emptied) = remove_slivers(vec![
            territory(1, "CO", "A", 1.0, thin),
            territory(2, "CO", "A", 1.0, only_sliver),
        ], SLIVER_BUFFER);
        assert_eq!((parts, emptied), (2, 1));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].geometry.0.len(), 1);
        assert!((out[0].area - 100.0).abs() < 1e-9);
    }

    #[test]
    fn identical_geometry_keeps_largest_customer_count() {
        let (out, removed) = remove_duplicates(vec![
            territory(1, "CO", "A", 10.0, square(0.0, 0.0, 1.0)),
            territory(2, "CO", "A", 30.0, square(0.0, 0.0, 1.0)),
            territory(3, "CO", "A", 5.0, square(5.0, 5.0, 1.0)),
        ]);
        assert_eq!(removed, 1);
        assert_eq!(out.iter().map(|t| t.utility_id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn dissolve_unions_by_state_and_ba() {
        let (shapes, discarded) = dissolve(&[
            territory(1, "CO", "PSCO", 1.0, square(0.0, 0.0, 2.0)),
            territory(2, "CO", "PSCO", 1.0, square(2.0, 0.0, 2.0)),
            territory(3, "CO", "WACM", 1.0, square(10.0, 0.0, 2.0)),
        ]);
        assert_eq!(discarded, 0);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].ba_code, "PSCO");
        assert!((shapes[0].geometry.unsigned_area() - 8.0).abs() < 1e-9);
        assert!(shapes[0].geometry.intersects(&square(1.0, 1.0, 2.0)));
    }

    #[test]
    fn state_overlay_splits_crossing_territory() {
        let raw = RawTerritory {
            utility_id: "1".into(),
            name: "Cross".into(),
            state: "CO".into(),
            geometry: square(5.0, 0.0, 10.0),
        };
        let states = vec![
            StateBoundary { state: "CO".into(), geometry: square(0.0, 0.0, 10.0) },
            StateBoundary { state: "KS".into(), geometry: square(10.0, 0.0, 10.0) },
        ];
        let (pieces, outside) = split_by_state(vec![raw], &states);
        assert!(outside.is_empty());
        assert_eq!(pieces.iter().map(|p| p.state.as_str()).collect::<Vec<_>>(), vec!["CO", "KS"]);
        assert!(pieces.iter().all(|p| (p.geometry.unsigned_area() - 50.0).abs() < 1e-9));
    }

    #[test]
    fn territory_outside_every_state_is_reported() {
        let raw = |id: &str, geometry| RawTerritory { utility_id: id.into(), name: String::new(), state: String::new(), geometry };
        let states = vec![StateBoundary { state: "CO".into(), geometry: square(0.0, 0.0, 10.0) }];
        let (pieces, outside) = split_by_state(vec![
            raw("1", square(1.0, 1.0, 2.0)),
            raw("9", square(50.0, 50.0, 5.0)),
            raw("8", square(10.0, 0.0, 5.0)),
        ], &states);
        assert_eq!(pieces.len(), 1);
        assert_eq!(outside, vec!["9", "8"]);
    }
}
