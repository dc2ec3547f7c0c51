//! Domain types: geos, group assignments, group ratios and ids.

pub mod assignment;
pub mod geo;
pub mod ids;
pub mod ratios;

pub use assignment::GeoAssignment;
pub use geo::{order_by_volume, Geo};
pub use ids::{GeoId, GroupId, StratumId};
pub use ratios::GroupRatios;
