//! Serializable design configuration, loaded from TOML.
//!
//! ```toml
//! n_groups = 2
//! group_ratios = [2, 1]          # optional, defaults to one slot per group
//! ordering = "volume_descending" # or "as_given" (default)
//!
//! [[geos]]
//! id = "501"
//! volume = 1250.0
//! group = 1                      # optional: 0 = excluded, k = fixed to group k
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use geostrata_core::{
    order_by_volume, Geo, GeoAssignment, GeoId, GeoStrata, GroupRatios, StrataError,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read design file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid design TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize design: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid design: {0}")]
    Design(#[from] StrataError),
}

/// Order in which geos enter stratification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoOrdering {
    /// Keep the order of the `[[geos]]` entries.
    #[default]
    AsGiven,
    /// Largest volume first, ties by geo id.
    VolumeDescending,
}

/// One `[[geos]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEntry {
    pub id: String,
    #[serde(default)]
    pub volume: f64,
    /// Integer group code: absent = free, 0 = excluded, k = fixed to group k.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,
}

/// A complete design file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignConfig {
    pub n_groups: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ratios: Option<Vec<u32>>,
    #[serde(default)]
    pub ordering: GeoOrdering,
    #[serde(default)]
    pub geos: Vec<GeoEntry>,
}

impl DesignConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Content hash of the design (BLAKE3 over its JSON form).
    ///
    /// Two identical design files share a fingerprint, which names their
    /// artifact directory.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Validate the file and compute strata.
    pub fn build(&self) -> Result<GeoStrata, ConfigError> {
        let ratios = self
            .group_ratios
            .clone()
            .map(GroupRatios::new)
            .transpose()?;

        let geos: Vec<Geo> = self
            .geos
            .iter()
            .map(|g| Geo::new(g.id.as_str(), g.volume))
            .collect();
        let geos = match self.ordering {
            GeoOrdering::AsGiven => geos,
            GeoOrdering::VolumeDescending => order_by_volume(geos)?,
        };

        let codes: HashMap<GeoId, Option<u32>> = self
            .geos
            .iter()
            .map(|g| (GeoId::new(g.id.as_str()), g.group))
            .collect();
        let assignments = geos
            .iter()
            .map(|g| GeoAssignment::from_code(codes.get(&g.id).copied().flatten()))
            .collect();

        Ok(GeoStrata::new(geos, assignments, self.n_groups, ratios)?)
    }
}
