use serde::{Deserialize, Serialize};

use super::GeoId;
use crate::error::StrataError;

/// A geographic unit with its ordering key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub id: GeoId,
    /// Size measure used to order geos before stratification (e.g. sales).
    pub volume: f64,
}

impl Geo {
    pub fn new(id: impl Into<GeoId>, volume: f64) -> Self {
        Self { id: id.into(), volume }
    }
}

impl From<String> for GeoId {
    fn from(s: String) -> Self {
        GeoId(s)
    }
}

/// Sort geos by volume, largest first. Ties keep id order so the result
/// does not depend on input order.
pub fn order_by_volume(mut geos: Vec<Geo>) -> Result<Vec<Geo>, StrataError> {
    if let Some(bad) = geos.iter().find(|g| !g.volume.is_finite()) {
        return Err(StrataError::NonFiniteVolume(bad.id.clone()));
    }
    geos.sort_by(|a, b| b.volume.total_cmp(&a.volume).then_with(|| a.id.cmp(&b.id)));
    Ok(geos)
}
