use std::sync::Arc;

use super::geo_type::GeoType;
use crate::error::{StockError, StockResult};

/// Number of trailing characters of a tract id that are local to its county.
pub const LAST6: usize = 6;

/// Placeholder values that mean "no tract".
const PLACEHOLDERS: [&str; 5] = ["", "NA", "None", "nan", "null"];

/// Stable key for a state, county or tract.
/// Keeps the original GISJOIN-style text (e.g. "G0600010400100") without repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeoId {
    pub ty: GeoType,
    pub id: Arc<str>,
}

impl GeoId {
    pub fn new(ty: GeoType, id: &str) -> Self {
        Self { ty, id: Arc::from(id.trim()) }
    }

    /// Parse a tract id, rejecting placeholders and malformed lengths.
    pub fn tract(id: &str) -> Option<Self> {
        is_valid_tract(id).then(|| Self::new(GeoType::Tract, id))
    }

    /// Returns a new `GeoId` corresponding to the higher-level `GeoType`
    /// by truncating this GeoId's string to the correct prefix length.
    pub fn to_parent(&self, parent_ty: GeoType) -> StockResult<GeoId> {
        let len = parent_ty.id_len();

        // If the id is shorter than expected, just take the full id.
        let prefix = self.id.get(..self.id.len().min(len)).ok_or_else(|| {
            StockError::Data(format!("{:?} has no {} prefix of {len} bytes", self.id, parent_ty.to_str()))
        })?;

        Ok(GeoId { ty: parent_ty, id: Arc::from(prefix) })
    }

    #[inline] pub fn as_str(&self) -> &str { &self.id }
}

/// True for a well-formed tract id; placeholder text such as `NA` is not a tract.
pub fn is_valid_tract(id: &str) -> bool {
    let id = id.trim();
    !PLACEHOLDERS.contains(&id) && id.len() == GeoType::Tract.id_len() && id.is_ascii()
}

/// Rebuild a full tract id from its county and county-local part.
pub fn join_tract(county: &str, last6: &str) -> String {
    format!("{}{last6:0>width$}", county.trim(), width = LAST6)
}
