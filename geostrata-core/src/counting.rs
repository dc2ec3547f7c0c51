//! Exact randomization counting for a single stratum.
//!
//! Counts the ways the free geos of a stratum can be spread over the groups
//! without exceeding any group's remaining capacity. Geos are distinguishable;
//! slots within a group are not. All arithmetic happens in natural-log space:
//! - no free geos: one way
//! - free geos exactly fill the remaining capacity: multinomial
//!   `u! / prod(remaining[k]!)`
//! - otherwise: the sum of those multinomials over every allocation that
//!   fits, accumulated one group at a time
//!
//! Over-capacity strata (fixed geos already exceed a ratio) count as zero.

use serde::{Deserialize, Serialize};

use crate::compat::group_usage;
use crate::domain::{GeoAssignment, GroupRatios};
use crate::error::StrataError;

/// Log-counts closer than this to zero are treated as exactly one outcome.
pub const SINGLE_OUTCOME_TOLERANCE: f64 = 1e-9;

/// Which scale a count is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountScale {
    /// Natural logarithm of the count.
    #[default]
    Log,
    /// The count itself. May overflow to infinity for very large strata.
    Linear,
}

/// Number of distinct randomizations, stored as its natural log.
///
/// Zero is `log = -inf`. Serialized as the log, with `null` for zero so the
/// value survives JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub struct RandomizationCount {
    log: f64,
}

impl RandomizationCount {
    pub const ONE: RandomizationCount = RandomizationCount { log: 0.0 };

    pub fn zero() -> Self {
        Self { log: f64::NEG_INFINITY }
    }

    pub fn from_log(log: f64) -> Self {
        Self { log }
    }

    pub fn log(self) -> f64 {
        self.log
    }

    /// Exponentiated count.
    pub fn value(self) -> f64 {
        self.log.exp()
    }

    pub fn in_scale(self, scale: CountScale) -> f64 {
        match scale {
            CountScale::Log => self.log(),
            CountScale::Linear => self.value(),
        }
    }

    pub fn is_zero(self) -> bool {
        self.log == f64::NEG_INFINITY
    }

    /// Exactly one possible outcome.
    pub fn is_single(self) -> bool {
        self.log.abs() < SINGLE_OUTCOME_TOLERANCE
    }
}

impl From<Option<f64>> for RandomizationCount {
    fn from(log: Option<f64>) -> Self {
        log.map_or_else(RandomizationCount::zero, RandomizationCount::from_log)
    }
}

impl From<RandomizationCount> for Option<f64> {
    fn from(c: RandomizationCount) -> Self {
        if c.is_zero() {
            None
        } else {
            Some(c.log)
        }
    }
}

// ─── Math primitives ─────────────────────────────────────────────────

/// ln(n!) by direct summation. Exact enough for stratum-sized n.
pub fn ln_factorial(n: usize) -> f64 {
    (2..=n).map(|k| (k as f64).ln()).sum()
}

/// ln(sum(exp(values))) without overflow. Empty input gives -inf.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if values.len() == 1 {
        return max;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

// ─── Counting ────────────────────────────────────────────────────────

/// Count the randomizations of one stratum.
///
/// `stratum` holds the stratum's geos (free or fixed, never excluded) and must
/// not be longer than the stratum size. Invalid group ids fail with
/// `InvalidGroupId`. An over-capacity stratum returns zero.
pub fn count_randomizations(
    stratum: &[GeoAssignment],
    ratios: &GroupRatios,
) -> Result<RandomizationCount, StrataError> {
    let usage = group_usage(stratum, ratios)?;
    let remaining = usage.remaining(ratios);
    if remaining.iter().any(|&r| r < 0) {
        return Ok(RandomizationCount::zero());
    }
    let capacity: Vec<u32> = remaining.iter().map(|&r| r as u32).collect();
    Ok(RandomizationCount::from_log(log_count_completions(usage.free, &capacity)))
}

/// `count_randomizations` reported on the requested scale.
pub fn count_randomizations_scaled(
    stratum: &[GeoAssignment],
    ratios: &GroupRatios,
    scale: CountScale,
) -> Result<f64, StrataError> {
    Ok(count_randomizations(stratum, ratios)?.in_scale(scale))
}

/// ln of the number of ways to place `free` distinguishable geos into groups
/// with the given remaining capacities.
///
/// Sums `free! / prod(n_k!)` over every allocation `(n_1, .., n_k)` with
/// `n_k <= capacity[k]`, group by group. Cost is bounded by
/// `groups * free * max(capacity)`.
pub fn log_count_completions(free: usize, capacity: &[u32]) -> f64 {
    if free == 0 {
        return 0.0;
    }
    let ln_fact: Vec<f64> = (0..=free).map(ln_factorial).collect();

    // placed[m]: ln sum of prod(1 / n_k!) over allocations of m geos so far.
    let mut placed = vec![f64::NEG_INFINITY; free + 1];
    placed[0] = 0.0;
    for &cap in capacity {
        let cap = (cap as usize).min(free);
        placed = (0..=free)
            .map(|m| {
                let terms: Vec<f64> = (0..=cap.min(m))
                    .map(|j| placed[m - j] - ln_fact[j])
                    .collect();
                log_sum_exp(&terms)
            })
            .collect();
    }
    ln_fact[free] + placed[free]
}
