use serde::{Deserialize, Serialize};
use std::fmt;

use super::GroupId;

/// Per-geo group state.
///
/// The interchange format is an optional integer code: missing means
/// `Free`, `0` means `Excluded`, `k` means `FixedTo(GroupId(k))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum GeoAssignment {
    /// Free to be randomized.
    Free,
    /// Permanently excluded from stratification and randomization.
    Excluded,
    /// Fixed to a group by the user.
    FixedTo(GroupId),
}

impl GeoAssignment {
    pub fn from_code(code: Option<u32>) -> Self {
        match code {
            None => GeoAssignment::Free,
            Some(0) => GeoAssignment::Excluded,
            Some(k) => GeoAssignment::FixedTo(GroupId(k)),
        }
    }

    pub fn code(self) -> Option<u32> {
        match self {
            GeoAssignment::Free => None,
            GeoAssignment::Excluded => Some(0),
            GeoAssignment::FixedTo(g) => Some(g.0),
        }
    }

    pub fn is_excluded(self) -> bool {
        matches!(self, GeoAssignment::Excluded)
    }

    pub fn fixed_group(self) -> Option<GroupId> {
        match self {
            GeoAssignment::FixedTo(g) => Some(g),
            _ => None,
        }
    }
}

impl From<Option<u32>> for GeoAssignment {
    fn from(code: Option<u32>) -> Self {
        GeoAssignment::from_code(code)
    }
}

impl From<GeoAssignment> for Option<u32> {
    fn from(a: GeoAssignment) -> Self {
        a.code()
    }
}

impl fmt::Display for GeoAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoAssignment::Free => write!(f, "NA"),
            GeoAssignment::Excluded => write!(f, "0"),
            GeoAssignment::FixedTo(g) => write!(f, "{g}"),
        }
    }
}
