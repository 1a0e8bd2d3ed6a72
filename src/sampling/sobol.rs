//! Low-discrepancy Sobol points, per-column jitter, and categorical CDF inversion.

use ndarray::Array2;
use rand::Rng;

use crate::error::{StockError, StockResult};
use crate::sampling::direction::DIRECTION_PARAMS;

/// Bits of precision per coordinate.
const BITS: usize = 32;

/// Largest supported hyper-cube dimension.
pub const MAX_DIMENSION: usize = DIRECTION_PARAMS.len() + 1;

/// Direction integers V_1..V_32 for one dimension, scaled to 2^32.
fn direction_numbers(dim: usize) -> [u32; BITS] {
    let mut v = [0u32; BITS];
    if dim == 0 {
        for (k, slot) in v.iter_mut().enumerate() {
            *slot = 1 << (BITS - 1 - k);
        }
        return v;
    }

    let params = &DIRECTION_PARAMS[dim - 1];
    let s = params.s as usize;
    for k in 0..BITS.min(s) {
        v[k] = params.m[k] << (BITS - 1 - k);
    }
    for k in s..BITS {
        let mut value = v[k - s] ^ (v[k - s] >> s);
        for j in 1..s {
            if (params.a >> (s - 1 - j)) & 1 == 1 {
                value ^= v[k - j];
            }
        }
        v[k] = value;
    }
    v
}

/// Deterministic Sobol points in [0,1)^d, starting from index 0 (Gray-code order).
/// Row `i` is the `i`-th point.
pub fn sobol(d: usize, n: usize) -> StockResult<Array2<f64>> {
    if d == 0 {
        return Err(StockError::Sampling("Sobol dimension must be at least 1".into()));
    }
    if d > MAX_DIMENSION {
        return Err(StockError::Sampling(format!(
            "Sobol dimension {d} exceeds the supported maximum of {MAX_DIMENSION}; split the generation"
        )));
    }
    if (n as u64) > (1u64 << BITS) {
        return Err(StockError::Sampling(format!("cannot draw {n} Sobol points with {BITS}-bit precision")));
    }

    let directions = (0..d).map(direction_numbers).collect::<Vec<_>>();
    let scale = 1.0 / (1u64 << BITS) as f64;

    let mut points = Array2::<f64>::zeros((n, d));
    let mut state = vec![0u32; d];
    for i in 1..n {
        // Index of the lowest zero bit of i-1.
        let c = (!(i - 1)).trailing_zeros() as usize;
        for (j, x) in state.iter_mut().enumerate() {
            *x ^= directions[j][c];
            points[[i, j]] = f64::from(*x) * scale;
        }
    }
    Ok(points)
}

/// Shift every column by its own uniform offset in [0,1), modulo 1.
/// Returns the offsets so a run can record them.
pub fn jitter(points: &mut Array2<f64>, rng: &mut impl Rng) -> Vec<f64> {
    let offsets = (0..points.ncols()).map(|_| rng.random::<f64>()).collect::<Vec<_>>();
    apply_offsets(points, &offsets);
    offsets
}

/// Shift columns by known offsets, modulo 1.
pub fn apply_offsets(points: &mut Array2<f64>, offsets: &[f64]) {
    for (mut column, &offset) in points.columns_mut().into_iter().zip(offsets) {
        column.mapv_inplace(|x| {
            let shifted = (x + offset).fract();
            if shifted >= 1.0 { 0.0 } else { shifted }
        });
    }
}

/// Smallest index whose cumulative probability strictly exceeds `u`.
/// Zero-probability options are never returned; if rounding leaves the total
/// below `u`, the last positive option is chosen.
pub fn invert(probs: &[f64], u: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (j, &p) in probs.iter().enumerate() {
        if p <= 0.0 { continue }
        cumulative += p;
        last_positive = Some(j);
        if cumulative > u {
            return Some(j);
        }
    }
    last_positive
}
