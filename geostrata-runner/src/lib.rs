//! GeoStrata Runner — design files, parallel evaluation, report export.
//!
//! This crate builds on `geostrata-core` to provide:
//! - TOML design files with volume ordering and fixed group codes
//! - Per-stratum evaluation in parallel (compatibility, counts, fixedness)
//! - JSON and CSV artifacts with schema versioning

pub mod config;
pub mod export;
pub mod report;

pub use config::{ConfigError, DesignConfig, GeoEntry, GeoOrdering};
pub use export::{
    export_counts_csv, export_json, export_strata_csv, import_json, load_report, save_artifacts,
};
pub use report::{
    evaluate_config, evaluate_design, evaluate_design_serial, DesignReport, StratumReport,
    SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn design_report_is_send_sync() {
        assert_send::<DesignReport>();
        assert_sync::<DesignReport>();
        assert_send::<StratumReport>();
        assert_sync::<StratumReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<DesignConfig>();
        assert_sync::<DesignConfig>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
