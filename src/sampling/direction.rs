//! Primitive-polynomial parameters for Sobol dimensions 2..=40
//! (Joe & Kuo, "new-joe-kuo-6.21201"). Dimension 1 is the van der Corput sequence.

/// One row of the parameter table.
pub(super) struct DirectionParams {
    /// Degree of the primitive polynomial.
    pub s: u32,
    /// Interior coefficients of the polynomial, packed as bits.
    pub a: u32,
    /// Initial odd direction integers m_1..m_s.
    pub m: &'static [u32],
}

const fn p(s: u32, a: u32, m: &'static [u32]) -> DirectionParams {
    DirectionParams { s, a, m }
}

pub(super) const DIRECTION_PARAMS: [DirectionParams; 39] = [
    p(1, 0, &[1]),
    p(2, 1, &[1, 3]),
    p(3, 1, &[1, 3, 1]),
    p(3, 2, &[1, 1, 1]),
    p(4, 1, &[1, 1, 3, 3]),
    p(4, 4, &[1, 3, 5, 13]),
    p(5, 2, &[1, 1, 5, 5, 17]),
    p(5, 4, &[1, 1, 5, 5, 5]),
    p(5, 7, &[1, 1, 7, 11, 19]),
    p(5, 11, &[1, 1, 5, 1, 1]),
    p(5, 13, &[1, 1, 1, 3, 11]),
    p(5, 14, &[1, 3, 5, 5, 31]),
    p(6, 1, &[1, 3, 3, 9, 7, 49]),
    p(6, 13, &[1, 1, 1, 15, 21, 21]),
    p(6, 16, &[1, 3, 1, 13, 27, 49]),
    p(6, 19, &[1, 1, 1, 15, 7, 5]),
    p(6, 22, &[1, 3, 1, 15, 13, 25]),
    p(6, 25, &[1, 1, 5, 5, 19, 61]),
    p(7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    p(7, 4, &[1, 3, 7, 13, 13, 15, 69]),
    p(7, 7, &[1, 1, 3, 13, 7, 35, 63]),
    p(7, 8, &[1, 3, 5, 9, 1, 25, 53]),
    p(7, 14, &[1, 3, 1, 13, 9, 35, 107]),
    p(7, 19, &[1, 3, 1, 5, 27, 61, 31]),
    p(7, 21, &[1, 1, 5, 11, 19, 41, 61]),
    p(7, 28, &[1, 3, 5, 3, 3, 13, 69]),
    p(7, 31, &[1, 1, 7, 13, 1, 19, 1]),
    p(7, 32, &[1, 3, 7, 5, 13, 19, 59]),
    p(7, 37, &[1, 1, 3, 9, 25, 29, 41]),
    p(7, 41, &[1, 3, 5, 13, 23, 1, 55]),
    p(7, 42, &[1, 3, 7, 3, 13, 59, 17]),
    p(7, 50, &[1, 3, 1, 3, 5, 53, 69]),
    p(7, 55, &[1, 1, 5, 5, 23, 33, 13]),
    p(7, 56, &[1, 1, 7, 7, 1, 61, 123]),
    p(7, 59, &[1, 1, 7, 9, 13, 61, 49]),
    p(7, 62, &[1, 3, 3, 5, 3, 55, 33]),
    p(8, 14, &[1, 3, 1, 15, 31, 13, 49, 245]),
    p(8, 21, &[1, 3, 5, 15, 31, 59, 63, 97]),
    p(8, 22, &[1, 3, 1, 11, 11, 11, 77, 249]),
];
