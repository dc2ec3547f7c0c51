//! Error and diagnostic types shared by every stage of the core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{GeoId, StratumId};

/// Errors raised by strata assignment, compatibility checks and counting.
///
/// Everything except `InvalidGroupId` is a shape precondition and is rejected
/// when a design is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrataError {
    /// One or more fixed group ids fall outside `1..=n_groups`.
    /// `ids` holds every distinct offending id, ascending.
    #[error("invalid group id(s) {ids:?}: fixed groups must be in 1..={n_groups}")]
    InvalidGroupId { ids: Vec<u32>, n_groups: usize },

    #[error("n_groups must be at least 2, got {n_groups}")]
    TooFewGroups { n_groups: usize },

    #[error("n_groups ({n_groups}) exceeds the number of geos ({n_geos})")]
    TooManyGroups { n_groups: usize, n_geos: usize },

    #[error("group ratios must have one entry per group: expected {expected}, got {got}")]
    RatioLengthMismatch { expected: usize, got: usize },

    #[error("group ratio at position {index} must be positive")]
    NonPositiveRatio { index: usize },

    #[error("group ratios must not be empty")]
    EmptyRatios,

    #[error("stratum holds {len} geos but the stratum size is {strata_size}")]
    StratumTooLarge { len: usize, strata_size: usize },

    #[error("excluded geos cannot be part of a stratum")]
    ExcludedInStratum,

    #[error("assignments ({assignments}) do not match geos ({geos})")]
    AssignmentLengthMismatch { geos: usize, assignments: usize },

    #[error("duplicate geo id '{0}'")]
    DuplicateGeo(GeoId),

    #[error("unknown geo id '{0}'")]
    UnknownGeo(GeoId),

    #[error("geo '{0}' cannot move into or out of the excluded group after strata are assigned")]
    ExclusionChange(GeoId),

    #[error("geo '{0}' has a non-finite volume")]
    NonFiniteVolume(GeoId),
}

/// Non-fatal diagnostic: the fixed assignments of these strata already
/// exceed the capacity given by the group ratios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityExceeded {
    pub strata: Vec<StratumId>,
}

impl CapacityExceeded {
    /// Emit the warning through `tracing`. Does nothing for an empty list.
    pub fn emit(&self) {
        if self.strata.is_empty() {
            return;
        }
        let ids: Vec<String> = self.strata.iter().map(|s| s.to_string()).collect();
        tracing::warn!(
            strata = %ids.join(", "),
            "fixed geo assignments exceed the group ratios in {} stratum/strata",
            self.strata.len()
        );
    }
}
