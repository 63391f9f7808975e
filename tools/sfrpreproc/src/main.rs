use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use env_logger::{Env, TimestampPrecision};
use geo::SpatialReference;
use sfr::{ConnectivityCheck, SetupConfig};

#[derive(Parser, Debug)]
#[clap(name = "sfrpreproc", about = "Remove invalid segments, short reaches and disconnected cells of an SFR setup")]
pub struct Opt {
    #[clap(long = "config", short = 'c', help = "The SFR setup file")]
    pub config: PathBuf,

    #[clap(long = "reach-cutoff", help = "Minimum retained reach length, overrides the setup value")]
    pub reach_cutoff: Option<f64>,

    #[clap(long = "output", short = 'o', help = "Output directory, overrides the setup value")]
    pub output: Option<PathBuf>,

    #[clap(long = "connectivity-check", help = "elevation_proxy or reach_count")]
    pub connectivity_check: Option<ConnectivityCheck>,

    #[clap(long = "verbose", short = 'v', help = "Log every removed record")]
    pub verbose: bool,
}

fn spatial_reference(crs: &str) -> geo::Result<SpatialReference> {
    let path = Path::new(crs);
    match path.extension().map(|ext| ext.to_string_lossy().to_lowercase()).as_deref() {
        Some("prj" | "shp") => SpatialReference::from_prj_file(path),
        _ => SpatialReference::from_definition(crs),
    }
}

/// The spatial reference is informational, the cleanup itself does not depend on it
fn log_spatial_reference(crs: &str) {
    match spatial_reference(crs) {
        Ok(srs) => {
            log::info!("Grid spatial reference: {srs} (length units: {})", srs.length_units());
            if srs.is_geographic() {
                log::warn!("The grid has a geographic spatial reference, reach lengths and the reach cutoff are in degrees");
            }
        }
        Err(e) => log::warn!("Unsupported crs '{crs}', the length units of the reach cutoff are unknown ({e})"),
    }
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let default_filter = if opt.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let mut setup = SetupConfig::from_file(&opt.config)
        .with_context(|| format!("Failed to load setup '{}'", opt.config.display()))?;

    if let Some(reach_cutoff) = opt.reach_cutoff {
        setup.cleanup.set_reach_cutoff(reach_cutoff)?;
    }

    if let Some(check) = opt.connectivity_check {
        setup.cleanup.connectivity_check = check;
    }

    if let Some(output) = opt.output {
        setup.output_dir = output;
    }

    if let Some(crs) = &setup.crs {
        log_spatial_reference(crs);
    }

    log::info!(
        "Reach cutoff: {}, connectivity check: {}",
        setup.cleanup.reach_cutoff(),
        setup.cleanup.connectivity_check
    );

    let report = sfr::io::run(&setup)?;

    log::info!(
        "Removed {} segments, {} reaches and {} cells",
        report.segments_removed.total(),
        report.reaches_removed(),
        report.cells_removed
    );

    if !report.malformed.is_empty() {
        log::warn!("Skipped {} malformed records", report.malformed.len());
    }

    Ok(())
}
