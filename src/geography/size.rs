//! Floor-area size bins.

/// Upper edges (ft², inclusive) of each `building_area` bin; larger areas fall in the last bin.
pub const SIZE_BIN_EDGES: [f64; 9] = [
    1_000.0, 5_000.0, 10_000.0, 25_000.0, 50_000.0, 100_000.0, 200_000.0, 500_000.0, 1_000_000.0,
];

/// 1-based bin of a floor area.
pub fn size_bin(area_sqft: f64) -> u8 {
    SIZE_BIN_EDGES.iter().position(|&edge| area_sqft <= edge).unwrap_or(SIZE_BIN_EDGES.len()) as u8 + 1
}

/// Bin of a `building_area` option label such as `_1000`, `10001_25000` or `over_1mil`.
pub fn size_bin_of_label(label: &str) -> Option<u8> {
    fn amount(text: &str) -> Option<f64> {
        match text {
            "1mil" => Some(1_000_000.0),
            t => t.parse().ok(),
        }
    }

    let label = label.trim();
    if label.starts_with("over_") {
        return Some(SIZE_BIN_EDGES.len() as u8 + 1);
    }
    let upper = label.rsplit('_').next().and_then(amount)?;
    Some(size_bin(upper))
}
