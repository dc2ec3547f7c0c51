//! Ratio compatibility of a stratum's (possibly partial) assignment.
//!
//! A stratum is compatible when no group already holds more fixed geos than
//! its ratio allows. Group ids are validated first and every distinct bad id
//! is reported in one error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{GeoAssignment, GroupId, GroupRatios};
use crate::error::StrataError;

/// Tally of a stratum's assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUsage {
    /// Geos fixed to each group, indexed by `GroupId::index()`.
    pub used: Vec<u32>,
    /// Geos still free to be randomized.
    pub free: usize,
}

impl GroupUsage {
    /// Capacity left per group. Negative when the group is over capacity.
    pub fn remaining(&self, ratios: &GroupRatios) -> Vec<i64> {
        ratios
            .as_slice()
            .iter()
            .zip(&self.used)
            .map(|(&cap, &used)| i64::from(cap) - i64::from(used))
            .collect()
    }

    /// Groups whose fixed geos exceed their capacity.
    pub fn over_capacity(&self, ratios: &GroupRatios) -> Vec<GroupId> {
        self.remaining(ratios)
            .iter()
            .enumerate()
            .filter(|&(_, &r)| r < 0)
            .map(|(i, _)| GroupId(i as u32 + 1))
            .collect()
    }
}

/// Check every fixed group id against `1..=n_groups`.
///
/// Excluded entries are a precondition violation at this layer: callers pass
/// only the geos that belong to a stratum.
pub fn validate_group_ids(
    stratum: &[GeoAssignment],
    ratios: &GroupRatios,
) -> Result<(), StrataError> {
    if stratum.iter().any(|a| a.is_excluded()) {
        return Err(StrataError::ExcludedInStratum);
    }
    let invalid: BTreeSet<u32> = stratum
        .iter()
        .filter_map(|a| a.fixed_group())
        .filter(|&g| !ratios.contains(g))
        .map(|g| g.0)
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(StrataError::InvalidGroupId {
            ids: invalid.into_iter().collect(),
            n_groups: ratios.n_groups(),
        })
    }
}

/// Validate and tally a stratum.
///
/// A stratum never holds more geos than the stratum size.
pub fn group_usage(
    stratum: &[GeoAssignment],
    ratios: &GroupRatios,
) -> Result<GroupUsage, StrataError> {
    let strata_size = ratios.strata_size();
    if stratum.len() > strata_size {
        return Err(StrataError::StratumTooLarge {
            len: stratum.len(),
            strata_size,
        });
    }
    validate_group_ids(stratum, ratios)?;
    let mut used = vec![0u32; ratios.n_groups()];
    let mut free = 0;
    for a in stratum {
        match a {
            GeoAssignment::Free => free += 1,
            GeoAssignment::FixedTo(g) => {
                if let Some(i) = g.index() {
                    used[i] += 1;
                }
            }
            GeoAssignment::Excluded => {}
        }
    }
    Ok(GroupUsage { used, free })
}

/// True if the fixed assignments fit within every group's capacity.
pub fn is_compatible(
    stratum: &[GeoAssignment],
    ratios: &GroupRatios,
) -> Result<bool, StrataError> {
    let usage = group_usage(stratum, ratios)?;
    Ok(usage.remaining(ratios).iter().all(|&r| r >= 0))
}
