use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique geo identifier (e.g. a DMA or region code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoId(pub String);

impl GeoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GeoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Experiment group, 1-based. Valid ids are `1..=n_groups`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl GroupId {
    /// Zero-based slot into a per-group vector. `None` for id 0.
    pub fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stratum number. `0` marks geos that are not part of any stratum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StratumId(pub u32);

impl StratumId {
    pub const EXCLUDED: StratumId = StratumId(0);

    pub fn is_excluded(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StratumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_index_is_zero_based() {
        assert_eq!(GroupId(1).index(), Some(0));
        assert_eq!(GroupId(3).index(), Some(2));
        assert_eq!(GroupId(0).index(), None);
    }

    #[test]
    fn ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&GeoId::new("501")).unwrap(), "\"501\"");
        assert_eq!(serde_json::to_string(&StratumId(4)).unwrap(), "4");
    }
}
