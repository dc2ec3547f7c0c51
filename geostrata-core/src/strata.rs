//! Stratum assignment.
//!
//! Assignable geos (anything not excluded) are taken in order and cut into
//! consecutive blocks of `strata_size = sum(ratios)`. Block `i` becomes
//! stratum `i`; the last block may be short. Excluded geos keep their
//! position and get stratum 0.

use crate::domain::{GeoAssignment, GroupRatios, StratumId};

/// Compute one stratum number per geo, in input order.
pub fn assign_strata(assignments: &[GeoAssignment], ratios: &GroupRatios) -> Vec<StratumId> {
    let strata_size = ratios.strata_size();
    let mut assignable = 0usize;

    assignments
        .iter()
        .map(|a| {
            if a.is_excluded() {
                StratumId::EXCLUDED
            } else {
                let stratum = assignable / strata_size + 1;
                assignable += 1;
                StratumId(stratum as u32)
            }
        })
        .collect()
}

/// Number of non-zero strata produced for `n_assignable` geos.
pub fn strata_count(n_assignable: usize, ratios: &GroupRatios) -> usize {
    n_assignable.div_ceil(ratios.strata_size())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroupId;

    fn ids(v: &[StratumId]) -> Vec<u32> {
        v.iter().map(|s| s.0).collect()
    }

    #[test]
    fn excluded_geo_keeps_position() {
        let mut assignments = vec![GeoAssignment::Free; 10];
        assignments[1] = GeoAssignment::Excluded;
        let strata = assign_strata(&assignments, &GroupRatios::uniform(2).unwrap());
        assert_eq!(ids(&strata), vec![1, 0, 1, 2, 2, 3, 3, 4, 4, 5]);
    }

    #[test]
    fn fixed_geos_are_assignable() {
        let assignments = vec![
            GeoAssignment::FixedTo(GroupId(2)),
            GeoAssignment::Free,
            GeoAssignment::FixedTo(GroupId(1)),
            GeoAssignment::Free,
        ];
        let strata = assign_strata(&assignments, &GroupRatios::new(vec![2, 1]).unwrap());
        assert_eq!(ids(&strata), vec![1, 1, 1, 2]);
    }

    #[test]
    fn all_excluded_gives_all_zero() {
        let assignments = vec![GeoAssignment::Excluded; 4];
        let strata = assign_strata(&assignments, &GroupRatios::uniform(2).unwrap());
        assert!(strata.iter().all(|s| s.is_excluded()));
    }

    #[test]
    fn empty_input() {
        assert!(assign_strata(&[], &GroupRatios::uniform(2).unwrap()).is_empty());
    }

    #[test]
    fn count_rounds_up() {
        let r = GroupRatios::new(vec![2, 1]).unwrap();
        assert_eq!(strata_count(0, &r), 0);
        assert_eq!(strata_count(3, &r), 1);
        assert_eq!(strata_count(7, &r), 3);
    }
}
