//! Design evaluation: per-stratum compatibility and randomization counts.
//!
//! Strata are independent, so `evaluate_design` counts them in parallel with
//! rayon. Rows are sorted by stratum id afterwards, so the report does not
//! depend on completion order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use geostrata_core::{
    count_randomizations, group_usage, CapacityExceeded, GeoAssignment, GeoStrata, GroupRatios,
    RandomizationCount, StrataError, StratumId,
};

use crate::config::{ConfigError, DesignConfig};

/// Schema version of persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Evaluation of one stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumReport {
    pub stratum: StratumId,
    /// Geos in the stratum (fixed and free).
    pub size: usize,
    /// Geos still free to be randomized.
    pub free: usize,
    /// Geos fixed to each group.
    pub used: Vec<u32>,
    /// Capacity left per group; negative when over capacity.
    pub remaining: Vec<i64>,
    pub compatible: bool,
    /// Randomization count (log scale; `null` when zero).
    pub log_count: RandomizationCount,
}

impl StratumReport {
    pub fn count(&self) -> f64 {
        self.log_count.value()
    }
}

/// Evaluation of a whole design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Content hash of the design file, when the report came from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub n_geos: usize,
    pub n_excluded: usize,
    pub n_groups: usize,
    pub group_ratios: GroupRatios,
    pub strata_size: usize,
    pub strata: Vec<StratumReport>,
    pub capacity_exceeded: CapacityExceeded,
    /// ln of the number of randomizations of the whole design.
    pub total_log_randomizations: RandomizationCount,
    /// True when the design has exactly one possible outcome.
    pub is_fixed: bool,
}

fn evaluate_stratum(
    stratum: StratumId,
    assignments: &[GeoAssignment],
    ratios: &GroupRatios,
) -> Result<StratumReport, StrataError> {
    let usage = group_usage(assignments, ratios)?;
    let remaining = usage.remaining(ratios);
    let compatible = remaining.iter().all(|&r| r >= 0);
    let log_count = count_randomizations(assignments, ratios)?;
    Ok(StratumReport {
        stratum,
        size: assignments.len(),
        free: usage.free,
        used: usage.used,
        remaining,
        compatible,
        log_count,
    })
}

fn assemble(design: &GeoStrata, mut strata: Vec<StratumReport>) -> DesignReport {
    strata.sort_by_key(|s| s.stratum);

    let capacity_exceeded = CapacityExceeded {
        strata: strata
            .iter()
            .filter(|s| !s.compatible)
            .map(|s| s.stratum)
            .collect(),
    };
    capacity_exceeded.emit();

    let total: f64 = strata.iter().map(|s| s.log_count.log()).sum();
    let is_fixed = strata.iter().all(|s| s.log_count.is_single());
    let n_excluded = design.assignments().iter().filter(|a| a.is_excluded()).count();

    tracing::debug!(
        strata = strata.len(),
        excluded = n_excluded,
        total_log = total,
        is_fixed,
        "design evaluated"
    );

    DesignReport {
        schema_version: SCHEMA_VERSION,
        fingerprint: None,
        n_geos: design.geos().len(),
        n_excluded,
        n_groups: design.n_groups(),
        group_ratios: design.ratios().clone(),
        strata_size: design.strata_size(),
        strata,
        capacity_exceeded,
        total_log_randomizations: RandomizationCount::from_log(total),
        is_fixed,
    }
}

/// Evaluate every stratum of `design`, in parallel.
pub fn evaluate_design(design: &GeoStrata) -> Result<DesignReport, StrataError> {
    let by_stratum: Vec<(StratumId, Vec<GeoAssignment>)> =
        design.strata_assignments().into_iter().collect();
    let ratios = design.ratios();
    let strata = by_stratum
        .par_iter()
        .map(|(id, assignments)| evaluate_stratum(*id, assignments, ratios))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(assemble(design, strata))
}

/// Same as `evaluate_design`, on the calling thread.
pub fn evaluate_design_serial(design: &GeoStrata) -> Result<DesignReport, StrataError> {
    let ratios = design.ratios();
    let strata = design
        .strata_assignments()
        .iter()
        .map(|(id, assignments)| evaluate_stratum(*id, assignments, ratios))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(assemble(design, strata))
}

/// Build the design described by `config` and evaluate it, tagging the
/// report with the config fingerprint.
pub fn evaluate_config(config: &DesignConfig) -> Result<(GeoStrata, DesignReport), ConfigError> {
    let design = config.build()?;
    let mut report = evaluate_design(&design)?;
    report.fingerprint = Some(config.fingerprint()?);
    Ok((design, report))
}
