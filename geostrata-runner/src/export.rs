//! Report export — JSON and CSV artifacts.
//!
//! - **JSON**: the full `DesignReport`, with schema versioning
//! - **CSV**: the per-geo strata table and the per-stratum counts
//!
//! Persisted reports carry a `schema_version`; newer versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use geostrata_core::GeoStrata;

use crate::report::{DesignReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &DesignReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize DesignReport to JSON")
}

/// Deserialize a `DesignReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<DesignReport> {
    let report: DesignReport =
        serde_json::from_str(json).context("failed to deserialize DesignReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Per-geo strata table.
///
/// Columns: geo, volume, stratum, group. `group` is empty for free geos and
/// `0` for excluded ones.
pub fn export_strata_csv(design: &GeoStrata) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["geo", "volume", "stratum", "group"])?;
    for row in design.rows() {
        wtr.write_record([
            row.geo.to_string(),
            row.volume.to_string(),
            row.stratum.to_string(),
            row.group.code().map(|g| g.to_string()).unwrap_or_default(),
        ])?;
    }
    let bytes = wtr.into_inner().context("failed to flush strata CSV")?;
    String::from_utf8(bytes).context("strata CSV is not valid UTF-8")
}

/// Per-stratum counts.
///
/// Columns: stratum, size, free, compatible, log_count, count. Zero counts
/// are written as `-inf` / `0`.
pub fn export_counts_csv(report: &DesignReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["stratum", "size", "free", "compatible", "log_count", "count"])?;
    for s in &report.strata {
        wtr.write_record([
            s.stratum.to_string(),
            s.size.to_string(),
            s.free.to_string(),
            s.compatible.to_string(),
            format!("{:.6}", s.log_count.log()),
            format!("{}", s.count()),
        ])?;
    }
    let bytes = wtr.into_inner().context("failed to flush counts CSV")?;
    String::from_utf8(bytes).context("counts CSV is not valid UTF-8")
}

// ─── Artifacts ──────────────────────────────────────────────────────

/// Write all artifacts for a design into a subdirectory of `output_dir`.
///
/// The subdirectory is named after the first 12 characters of the report
/// fingerprint (`design` when there is none) and contains:
/// - `report.json` — the full `DesignReport`
/// - `strata.csv` — per-geo strata table
/// - `counts.csv` — per-stratum counts
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    report: &DesignReport,
    design: &GeoStrata,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = report
        .fingerprint
        .as_deref()
        .map(|f| f.chars().take(12).collect::<String>())
        .unwrap_or_else(|| "design".to_string());
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("strata.csv"), export_strata_csv(design)?)?;
    std::fs::write(run_dir.join("counts.csv"), export_counts_csv(report)?)?;

    tracing::info!(dir = %run_dir.display(), "saved design artifacts");
    Ok(run_dir)
}

/// Load a `DesignReport` from an artifact directory's report.json.
pub fn load_report(dir: &Path) -> Result<DesignReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::evaluate_design;
    use geostrata_core::{Geo, GeoAssignment, GroupId};

    fn design() -> GeoStrata {
        let geos = vec![Geo::new("a", 3.0), Geo::new("b", 2.0), Geo::new("c", 1.0)];
        let assignments = vec![
            GeoAssignment::FixedTo(GroupId(1)),
            GeoAssignment::Excluded,
            GeoAssignment::Free,
        ];
        GeoStrata::new(geos, assignments, 2, None).unwrap()
    }

    #[test]
    fn strata_csv_has_codes() {
        let csv = export_strata_csv(&design()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "geo,volume,stratum,group");
        assert_eq!(lines[1], "a,3,1,1");
        assert_eq!(lines[2], "b,2,0,0");
        assert_eq!(lines[3], "c,1,1,");
    }

    #[test]
    fn counts_csv_lists_strata() {
        let report = evaluate_design(&design()).unwrap();
        let csv = export_counts_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "1,2,1,true,0.000000,1");
    }

    #[test]
    fn json_round_trip() {
        let report = evaluate_design(&design()).unwrap();
        let back = import_json(&export_json(&report).unwrap()).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn rejects_future_schema() {
        let mut report = evaluate_design(&design()).unwrap();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&report).unwrap();
        assert!(import_json(&json).is_err());
    }
}
