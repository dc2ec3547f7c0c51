use serde::{Deserialize, Serialize};

use super::GroupId;
use crate::error::StrataError;

/// Integer group-size ratios. Group `k` receives `ratios[k - 1]` slots in
/// every full stratum, so the stratum size is their sum.
///
/// Ratios are taken literally and never reduced: `[2, 2]` gives strata of
/// four geos, not two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct GroupRatios(Vec<u32>);

impl GroupRatios {
    pub fn new(ratios: Vec<u32>) -> Result<Self, StrataError> {
        if ratios.is_empty() {
            return Err(StrataError::EmptyRatios);
        }
        if let Some(index) = ratios.iter().position(|&r| r == 0) {
            return Err(StrataError::NonPositiveRatio { index });
        }
        Ok(Self(ratios))
    }

    /// One slot per group: the default when no ratios are supplied.
    pub fn uniform(n_groups: usize) -> Result<Self, StrataError> {
        Self::new(vec![1; n_groups])
    }

    pub fn n_groups(&self) -> usize {
        self.0.len()
    }

    pub fn strata_size(&self) -> usize {
        self.0.iter().map(|&r| r as usize).sum()
    }

    /// Capacity of `group` in a full stratum; `None` for ids outside `1..=n_groups`.
    pub fn capacity(&self, group: GroupId) -> Option<u32> {
        group.index().and_then(|i| self.0.get(i).copied())
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.capacity(group).is_some()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl TryFrom<Vec<u32>> for GroupRatios {
    type Error = StrataError;

    fn try_from(v: Vec<u32>) -> Result<Self, Self::Error> {
        GroupRatios::new(v)
    }
}

impl From<GroupRatios> for Vec<u32> {
    fn from(r: GroupRatios) -> Self {
        r.0
    }
}
