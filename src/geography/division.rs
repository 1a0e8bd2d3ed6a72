//! Fixed state to census-division lookup.

/// (FIPS, postal abbreviation, census division)
const STATES: [(&str, &str, &str); 51] = [
    ("01", "AL", "East South Central"),
    ("02", "AK", "Pacific"),
    ("04", "AZ", "Mountain"),
    ("05", "AR", "West South Central"),
    ("06", "CA", "Pacific"),
    ("08", "CO", "Mountain"),
    ("09", "CT", "New England"),
    ("10", "DE", "South Atlantic"),
    ("11", "DC", "South Atlantic"),
    ("12", "FL", "South Atlantic"),
    ("13", "GA", "South Atlantic"),
    ("15", "HI", "Pacific"),
    ("16", "ID", "Mountain"),
    ("17", "IL", "East North Central"),
    ("18", "IN", "East North Central"),
    ("19", "IA", "West North Central"),
    ("20", "KS", "West North Central"),
    ("21", "KY", "East South Central"),
    ("22", "LA", "West South Central"),
    ("23", "ME", "New England"),
    ("24", "MD", "South Atlantic"),
    ("25", "MA", "New England"),
    ("26", "MI", "East North Central"),
    ("27", "MN", "West North Central"),
    ("28", "MS", "East South Central"),
    ("29", "MO", "West North Central"),
    ("30", "MT", "Mountain"),
    ("31", "NE", "West North Central"),
    ("32", "NV", "Mountain"),
    ("33", "NH", "New England"),
    ("34", "NJ", "Middle Atlantic"),
    ("35", "NM", "Mountain"),
    ("36", "NY", "Middle Atlantic"),
    ("37", "NC", "South Atlantic"),
    ("38", "ND", "West North Central"),
    ("39", "OH", "East North Central"),
    ("40", "OK", "West South Central"),
    ("41", "OR", "Pacific"),
    ("42", "PA", "Middle Atlantic"),
    ("44", "RI", "New England"),
    ("45", "SC", "South Atlantic"),
    ("46", "SD", "West North Central"),
    ("47", "TN", "East South Central"),
    ("48", "TX", "West South Central"),
    ("49", "UT", "Mountain"),
    ("50", "VT", "New England"),
    ("51", "VA", "South Atlantic"),
    ("53", "WA", "Pacific"),
    ("54", "WV", "South Atlantic"),
    ("55", "WI", "East North Central"),
    ("56", "WY", "Mountain"),
];

fn find(state: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    let s = state.trim();
    // Accept "G06", "06" or "CA".
    let key = s.strip_prefix('G').filter(|rest| rest.len() >= 2 && rest.as_bytes()[..2].iter().all(u8::is_ascii_digit))
        .map(|rest| &rest[..2])
        .unwrap_or(s);
    STATES.iter().find(|(fips, abbr, _)| *fips == key || abbr.eq_ignore_ascii_case(key))
}

/// Census division of a state given as GISJOIN prefix, FIPS code, or postal abbreviation.
pub fn census_division(state: &str) -> Option<&'static str> {
    find(state).map(|(_, _, division)| *division)
}
