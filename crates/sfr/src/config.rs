//! Configuration of the reach cleanup pass and the setup file it is read from.
//!
//! The setup file is the flat `key=value` format shared by all steps of the SFR workflow:
//!
//! ```text
//! # comment lines start with a '#'
//! reach_cutoff=1.0        # anything after the value is ignored
//! reaches='river_explode.csv'
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{Error, Result};

/// How connectivity repair decides that a river cell lost all of its reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConnectivityCheck {
    /// A cell is dropped when none of the reaches joined to it carries an elevation.
    /// A cell with a remaining reach that has no elevation is dropped as well.
    #[default]
    ElevationProxy,
    /// A cell is dropped when no reach references it
    ReachCount,
}

impl FromStr for ConnectivityCheck {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "elevation_proxy" | "elevation-proxy" => Ok(ConnectivityCheck::ElevationProxy),
            "reach_count" | "reach-count" => Ok(ConnectivityCheck::ReachCount),
            _ => Err(Error::Configuration(format!(
                "Invalid connectivity check '{s}' (expected elevation_proxy or reach_count)"
            ))),
        }
    }
}

impl std::fmt::Display for ConnectivityCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectivityCheck::ElevationProxy => write!(f, "elevation_proxy"),
            ConnectivityCheck::ReachCount => write!(f, "reach_count"),
        }
    }
}

/// What to do with a record that lacks a required numeric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MalformedRecordPolicy {
    /// Leave the record out of the pass and report it
    #[default]
    Skip,
    /// Fail the whole pass
    Abort,
}

impl FromStr for MalformedRecordPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(MalformedRecordPolicy::Skip),
            "abort" => Ok(MalformedRecordPolicy::Abort),
            _ => Err(Error::Configuration(format!(
                "Invalid malformed record policy '{s}' (expected skip or abort)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CleanupConfig {
    reach_cutoff: f64,
    pub connectivity_check: ConnectivityCheck,
    pub malformed_records: MalformedRecordPolicy,
}

impl CleanupConfig {
    /// `reach_cutoff` is the minimum retained reach length in grid length units, it must be finite and non-negative
    pub fn new(reach_cutoff: f64) -> Result<Self> {
        Ok(Self {
            reach_cutoff: validate_reach_cutoff(reach_cutoff)?,
            connectivity_check: ConnectivityCheck::default(),
            malformed_records: MalformedRecordPolicy::default(),
        })
    }

    pub fn with_connectivity_check(mut self, check: ConnectivityCheck) -> Self {
        self.connectivity_check = check;
        self
    }

    pub fn with_malformed_records(mut self, policy: MalformedRecordPolicy) -> Self {
        self.malformed_records = policy;
        self
    }

    pub fn reach_cutoff(&self) -> f64 {
        self.reach_cutoff
    }

    pub fn set_reach_cutoff(&mut self, reach_cutoff: f64) -> Result {
        self.reach_cutoff = validate_reach_cutoff(reach_cutoff)?;
        Ok(())
    }
}

fn validate_reach_cutoff(reach_cutoff: f64) -> Result<f64> {
    if !reach_cutoff.is_finite() || reach_cutoff < 0.0 {
        return Err(Error::Configuration(format!(
            "reach_cutoff must be a finite non-negative number, got {reach_cutoff}"
        )));
    }

    Ok(reach_cutoff)
}

pub mod keys {
    pub const REACH_CUTOFF: &str = "reach_cutoff";
    pub const SEGMENTS: [&str; 2] = ["segments", "flowlines"];
    pub const REACHES: [&str; 2] = ["reaches", "river_explode"];
    pub const CELLS: [&str; 2] = ["cells", "river_cells_dissolve"];
    pub const OUTPUT_DIR: &str = "output_dir";
    pub const CONNECTIVITY_CHECK: &str = "connectivity_check";
    pub const MALFORMED_RECORDS: &str = "malformed_records";
    pub const CRS: &str = "crs";
}

const DEFAULT_OUTPUT_DIR: &str = "output";

/// Everything a reach cleanup run needs, as read from the setup file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetupConfig {
    pub cleanup: CleanupConfig,
    /// Flowline segments with their attributes, optional
    pub segments: Option<PathBuf>,
    /// Flowline segments exploded to the model grid cells
    pub reaches: PathBuf,
    /// The river cells of the model grid, dissolved on cell number
    pub cells: PathBuf,
    pub output_dir: PathBuf,
    /// Spatial reference of the model grid, used to report the length units of the cutoff
    pub crs: Option<String>,
}

impl SetupConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("Failed to read setup file '{}' ({e})", path.display())))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&contents, base_dir)
    }

    /// Relative paths in the setup are resolved against `base_dir`
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self> {
        let values = parse_setup_values(contents);
        let resolve = |value: String| {
            let path = PathBuf::from(value);
            if path.is_absolute() { path } else { base_dir.join(path) }
        };

        let reach_cutoff = lookup(&values, &[keys::REACH_CUTOFF])
            .ok_or_else(|| Error::Configuration(format!("Missing '{}' in setup", keys::REACH_CUTOFF)))?;
        let reach_cutoff = reach_cutoff
            .parse::<f64>()
            .map_err(|_| Error::Configuration(format!("Invalid {} value '{reach_cutoff}'", keys::REACH_CUTOFF)))?;

        let mut cleanup = CleanupConfig::new(reach_cutoff)?;
        if let Some(check) = lookup(&values, &[keys::CONNECTIVITY_CHECK]) {
            cleanup.connectivity_check = check.parse()?;
        }

        if let Some(policy) = lookup(&values, &[keys::MALFORMED_RECORDS]) {
            cleanup.malformed_records = policy.parse()?;
        }

        Ok(SetupConfig {
            cleanup,
            segments: lookup(&values, &keys::SEGMENTS).map(resolve),
            reaches: resolve(require(&values, &keys::REACHES)?),
            cells: resolve(require(&values, &keys::CELLS)?),
            output_dir: resolve(lookup(&values, &[keys::OUTPUT_DIR]).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string())),
            crs: lookup(&values, &[keys::CRS]),
        })
    }
}

/// The value of the first of `names` present in the setup
fn lookup(values: &BTreeMap<String, String>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| values.get(*name).cloned())
}

fn require(values: &BTreeMap<String, String>, names: &[&str]) -> Result<String> {
    lookup(values, names).ok_or_else(|| Error::Configuration(format!("Missing '{}' in setup", names.join("' or '"))))
}

/// Parses the `key=value` lines, keys are lowercased, the value is the first word after the `=`
/// with quotes stripped. Lines starting with a `#` and lines without `=` are ignored.
pub fn parse_setup_values(contents: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, rest)) = line.split_once('=') else {
            log::debug!("Ignoring setup line without value: {line}");
            continue;
        };

        let Some(value) = rest.split_whitespace().next() else {
            continue;
        };

        let value = value.replace(['\'', '"'], "");
        values.insert(key.trim().to_lowercase(), value);
    }

    values
}
