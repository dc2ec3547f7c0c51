//! GeoStrata CLI — stratify a geo design and count its randomizations.
//!
//! Commands:
//! - `strata` — print (or write as CSV) the stratum of every geo
//! - `count` — per-stratum randomization counts, log scale by default
//! - `check` — report whether the design leaves anything to chance
//! - `report` — evaluate the design and write JSON/CSV artifacts

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use geostrata_core::CountScale;
use geostrata_runner::{evaluate_config, export_strata_csv, save_artifacts, DesignConfig};

#[derive(Parser)]
#[command(
    name = "geostrata",
    about = "GeoStrata CLI — stratified geo experiment design"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stratum of every geo.
    Strata {
        /// Path to a TOML design file.
        #[arg(long)]
        design: PathBuf,

        /// Write the strata table to this CSV file instead of stdout.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Count the randomizations of every stratum.
    Count {
        /// Path to a TOML design file.
        #[arg(long)]
        design: PathBuf,

        /// Report counts on the linear scale instead of natural log.
        #[arg(long, default_value_t = false)]
        linear: bool,

        /// Print the full report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check whether the randomization is fixed (exactly one outcome).
    Check {
        /// Path to a TOML design file.
        #[arg(long)]
        design: PathBuf,
    },
    /// Evaluate the design and write report.json, strata.csv and counts.csv.
    Report {
        /// Path to a TOML design file.
        #[arg(long)]
        design: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "reports")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Strata { design, csv } => run_strata(&design, csv.as_deref()),
        Commands::Count {
            design,
            linear,
            json,
        } => {
            let scale = if linear {
                CountScale::Linear
            } else {
                CountScale::Log
            };
            run_count(&design, scale, json)
        }
        Commands::Check { design } => run_check(&design),
        Commands::Report { design, output_dir } => run_report(&design, &output_dir),
    }
}

fn load(path: &Path) -> Result<DesignConfig> {
    tracing::debug!(path = %path.display(), "loading design");
    DesignConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn run_strata(path: &Path, csv: Option<&Path>) -> Result<()> {
    let design = load(path)?.build()?;
    let table = export_strata_csv(&design)?;
    match csv {
        Some(out) => {
            std::fs::write(out, table)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Wrote strata for {} geos to {}", design.geos().len(), out.display());
        }
        None => print!("{table}"),
    }
    Ok(())
}

fn run_count(path: &Path, scale: CountScale, json: bool) -> Result<()> {
    let (_, report) = evaluate_config(&load(path)?)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let label = match scale {
        CountScale::Log => "log_count",
        CountScale::Linear => "count",
    };
    println!("{:>8}  {:>5}  {:>5}  {:>10}  {label}", "stratum", "size", "free", "compatible");
    for s in &report.strata {
        println!(
            "{:>8}  {:>5}  {:>5}  {:>10}  {}",
            s.stratum.0,
            s.size,
            s.free,
            s.compatible,
            s.log_count.in_scale(scale)
        );
    }
    println!(
        "total {label}: {}",
        report.total_log_randomizations.in_scale(scale)
    );
    Ok(())
}

fn run_check(path: &Path) -> Result<()> {
    let (_, report) = evaluate_config(&load(path)?)?;
    if report.is_fixed {
        println!("fixed: every stratum has exactly one possible assignment");
    } else {
        println!(
            "not fixed: {} possible randomizations (log = {:.4})",
            report.total_log_randomizations.value(),
            report.total_log_randomizations.log()
        );
    }
    Ok(())
}

fn run_report(path: &Path, output_dir: &Path) -> Result<()> {
    let (design, report) = evaluate_config(&load(path)?)?;
    let dir = save_artifacts(&report, &design, output_dir)?;
    println!("Artifacts written to {}", dir.display());
    Ok(())
}
