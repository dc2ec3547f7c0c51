//! GeoStrata Core — stratification and randomization counting for geo experiments.
//!
//! This crate contains:
//! - Domain types (geos, group assignments, group ratios, ids)
//! - Stratum assignment from an ordered geo list
//! - Ratio compatibility checks for partially fixed strata
//! - Exact, log-scale counting of the randomizations of a stratum
//! - The `GeoStrata` design with fixed-randomization detection

pub mod compat;
pub mod counting;
pub mod design;
pub mod domain;
pub mod error;
pub mod strata;

pub use compat::{group_usage, is_compatible, validate_group_ids, GroupUsage};
pub use counting::{
    count_randomizations, count_randomizations_scaled, log_count_completions, log_sum_exp,
    ln_factorial, CountScale, RandomizationCount,
};
pub use design::{is_fixed_design, DesignCounts, GeoStrata, GeoStratumRow};
pub use domain::{order_by_volume, Geo, GeoAssignment, GeoId, GroupId, GroupRatios, StratumId};
pub use error::{CapacityExceeded, StrataError};
pub use strata::{assign_strata, strata_count};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: designs and results can cross threads, so the
    /// runner can evaluate strata in parallel.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<GeoStrata>();
        require_sync::<GeoStrata>();
        require_send::<GroupRatios>();
        require_sync::<GroupRatios>();
        require_send::<GeoAssignment>();
        require_sync::<GeoAssignment>();
        require_send::<RandomizationCount>();
        require_sync::<RandomizationCount>();
        require_send::<DesignCounts>();
        require_sync::<DesignCounts>();
        require_send::<StrataError>();
        require_sync::<StrataError>();
    }
}
