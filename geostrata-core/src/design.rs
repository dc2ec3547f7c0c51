//! Geo strata design: geos in randomization order, their group assignments
//! and the strata derived from them.
//!
//! Strata are computed once, at construction. Group fixes made afterwards
//! through `fix_geo_group` never move a geo between strata; counts and
//! compatibility are recomputed on every call.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::compat::{group_usage, is_compatible, validate_group_ids};
use crate::counting::{count_randomizations, RandomizationCount};
use crate::domain::{Geo, GeoAssignment, GeoId, GroupRatios, StratumId};
use crate::error::{CapacityExceeded, StrataError};
use crate::strata::assign_strata;

/// A stratified geo experiment design.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoStrata {
    geos: Vec<Geo>,
    assignments: Vec<GeoAssignment>,
    strata: Vec<StratumId>,
    ratios: GroupRatios,
}

/// One row of the per-geo strata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoStratumRow {
    pub geo: GeoId,
    pub volume: f64,
    pub stratum: StratumId,
    pub group: GeoAssignment,
}

/// Per-stratum randomization counts for a whole design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignCounts {
    /// Counts by stratum id, ascending. Incompatible strata count as zero.
    pub counts: Vec<(StratumId, RandomizationCount)>,
    /// Strata whose fixed geos exceed the group ratios.
    pub capacity_exceeded: CapacityExceeded,
}

impl DesignCounts {
    pub fn get(&self, stratum: StratumId) -> Option<RandomizationCount> {
        self.counts
            .binary_search_by_key(&stratum, |(id, _)| *id)
            .ok()
            .map(|i| self.counts[i].1)
    }

    /// ln of the number of randomizations of the whole design: strata are
    /// independent, so their log-counts add.
    pub fn total_log(&self) -> f64 {
        self.counts.iter().map(|(_, c)| c.log()).sum()
    }
}

impl GeoStrata {
    /// Build a design from geos already in randomization order.
    ///
    /// `assignments[i]` is the group state of `geos[i]`. Without `ratios`
    /// every group gets one slot per stratum.
    pub fn new(
        geos: Vec<Geo>,
        assignments: Vec<GeoAssignment>,
        n_groups: usize,
        ratios: Option<GroupRatios>,
    ) -> Result<Self, StrataError> {
        if n_groups < 2 {
            return Err(StrataError::TooFewGroups { n_groups });
        }
        if n_groups > geos.len() {
            return Err(StrataError::TooManyGroups {
                n_groups,
                n_geos: geos.len(),
            });
        }
        let ratios = match ratios {
            Some(ratios) => ratios,
            None => GroupRatios::uniform(n_groups)?,
        };
        if ratios.n_groups() != n_groups {
            return Err(StrataError::RatioLengthMismatch {
                expected: n_groups,
                got: ratios.n_groups(),
            });
        }
        if assignments.len() != geos.len() {
            return Err(StrataError::AssignmentLengthMismatch {
                geos: geos.len(),
                assignments: assignments.len(),
            });
        }
        let mut seen = HashSet::with_capacity(geos.len());
        for geo in &geos {
            if !seen.insert(&geo.id) {
                return Err(StrataError::DuplicateGeo(geo.id.clone()));
            }
        }
        let fixed: Vec<GeoAssignment> =
            assignments.iter().copied().filter(|a| !a.is_excluded()).collect();
        validate_group_ids(&fixed, &ratios)?;

        let strata = assign_strata(&assignments, &ratios);
        Ok(Self {
            geos,
            assignments,
            strata,
            ratios,
        })
    }

    /// Build a design where every geo is free to be randomized.
    pub fn unassigned(
        geos: Vec<Geo>,
        n_groups: usize,
        ratios: Option<GroupRatios>,
    ) -> Result<Self, StrataError> {
        let assignments = vec![GeoAssignment::Free; geos.len()];
        Self::new(geos, assignments, n_groups, ratios)
    }

    pub fn geos(&self) -> &[Geo] {
        &self.geos
    }

    pub fn assignments(&self) -> &[GeoAssignment] {
        &self.assignments
    }

    pub fn strata(&self) -> &[StratumId] {
        &self.strata
    }

    pub fn ratios(&self) -> &GroupRatios {
        &self.ratios
    }

    pub fn n_groups(&self) -> usize {
        self.ratios.n_groups()
    }

    pub fn strata_size(&self) -> usize {
        self.ratios.strata_size()
    }

    /// Non-zero stratum ids, ascending.
    pub fn stratum_ids(&self) -> Vec<StratumId> {
        let max = self.strata.iter().map(|s| s.0).max().unwrap_or(0);
        (1..=max).map(StratumId).collect()
    }

    /// Assignments of the geos in `stratum`, in geo order.
    pub fn stratum_assignments(&self, stratum: StratumId) -> Vec<GeoAssignment> {
        self.strata
            .iter()
            .zip(&self.assignments)
            .filter(|(s, _)| **s == stratum)
            .map(|(_, a)| *a)
            .collect()
    }

    /// Assignments grouped by stratum id, excluding stratum 0.
    pub fn strata_assignments(&self) -> BTreeMap<StratumId, Vec<GeoAssignment>> {
        let mut by_stratum: BTreeMap<StratumId, Vec<GeoAssignment>> = BTreeMap::new();
        for (s, a) in self.strata.iter().zip(&self.assignments) {
            if !s.is_excluded() {
                by_stratum.entry(*s).or_default().push(*a);
            }
        }
        by_stratum
    }

    pub fn rows(&self) -> Vec<GeoStratumRow> {
        self.geos
            .iter()
            .zip(&self.strata)
            .zip(&self.assignments)
            .map(|((geo, stratum), group)| GeoStratumRow {
                geo: geo.id.clone(),
                volume: geo.volume,
                stratum: *stratum,
                group: *group,
            })
            .collect()
    }

    /// Fix a geo to a group, or free it again. Strata do not change.
    ///
    /// Moving a geo into or out of the excluded group is rejected: that would
    /// leave it in the wrong stratum.
    pub fn fix_geo_group(&mut self, geo: &GeoId, group: GeoAssignment) -> Result<(), StrataError> {
        let index = self
            .geos
            .iter()
            .position(|g| &g.id == geo)
            .ok_or_else(|| StrataError::UnknownGeo(geo.clone()))?;
        if group.is_excluded() || self.assignments[index].is_excluded() {
            if group == self.assignments[index] {
                return Ok(());
            }
            return Err(StrataError::ExclusionChange(geo.clone()));
        }
        validate_group_ids(&[group], &self.ratios)?;
        self.assignments[index] = group;
        Ok(())
    }

    /// Compatibility verdict per stratum.
    pub fn compatibility(&self) -> Result<Vec<(StratumId, bool)>, StrataError> {
        self.strata_assignments()
            .into_iter()
            .map(|(id, stratum)| Ok((id, is_compatible(&stratum, &self.ratios)?)))
            .collect()
    }

    /// Strata whose fixed geos exceed the group ratios.
    pub fn capacity_exceeded(&self) -> Result<CapacityExceeded, StrataError> {
        let strata = self
            .compatibility()?
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(id, _)| id)
            .collect();
        Ok(CapacityExceeded { strata })
    }

    /// Count the randomizations of every stratum.
    ///
    /// Over-capacity strata are reported through a warning and the
    /// `capacity_exceeded` field, and count as zero; the other strata are
    /// counted normally.
    pub fn count_randomizations(&self) -> Result<DesignCounts, StrataError> {
        let mut counts = Vec::new();
        let mut exceeded = Vec::new();
        for (id, stratum) in self.strata_assignments() {
            let usage = group_usage(&stratum, &self.ratios)?;
            if !usage.over_capacity(&self.ratios).is_empty() {
                exceeded.push(id);
            }
            counts.push((id, count_randomizations(&stratum, &self.ratios)?));
        }
        let capacity_exceeded = CapacityExceeded { strata: exceeded };
        capacity_exceeded.emit();
        Ok(DesignCounts {
            counts,
            capacity_exceeded,
        })
    }

    pub fn total_log_randomizations(&self) -> Result<f64, StrataError> {
        Ok(self.count_randomizations()?.total_log())
    }

    /// True if the design leaves nothing to chance: every stratum has exactly
    /// one possible outcome.
    pub fn is_fixed(&self) -> Result<bool, StrataError> {
        let strata: Vec<Vec<GeoAssignment>> = self.strata_assignments().into_values().collect();
        is_fixed_design(&strata, &self.ratios)
    }
}

/// Fixed-randomization check over per-stratum assignment vectors.
///
/// Stops at the first stratum with more than one outcome. A stratum with
/// zero outcomes (over capacity) also makes the design not fixed.
pub fn is_fixed_design(
    strata: &[Vec<GeoAssignment>],
    ratios: &GroupRatios,
) -> Result<bool, StrataError> {
    for stratum in strata {
        if !count_randomizations(stratum, ratios)?.is_single() {
            return Ok(false);
        }
    }
    Ok(true)
}
