#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeoType {
    State,      // "G06"
    County,     // "G0600010", County -> State
    Tract,      // "G0600010400100", Tract -> County
}

impl GeoType {
    pub fn to_str(&self) -> &'static str {
        match self {
            GeoType::State => "state",
            GeoType::County => "county",
            GeoType::Tract => "tract",
        }
    }

    /// Length of an identifier at this level.
    pub fn id_len(&self) -> usize {
        match self {
            GeoType::State => 3,
            GeoType::County => 8,
            GeoType::Tract => 14,
        }
    }
}
