use std::collections::BTreeMap;
use std::path::Path;

use proj4rs::Proj;
use proj4rs::proj::ProjType;
use proj4wkt::wkt_to_projstring;

use crate::Error;
use crate::Result;
use crate::crs::Epsg;
use crate::srs::LengthUnit;

/// Proj parameters that do not change the meaning of a definition
const IGNORED_PROJ_PARAMS: [&str; 3] = ["no_defs", "type", "wktext"];

/// Proj parameters that refer to datum shift grids
const GRID_PROJ_PARAMS: [&str; 2] = ["+datum=", "+nadgrids="];

#[derive(Debug, Clone)]
pub struct SpatialReference {
    srs: Proj,
    epsg: Option<Epsg>,
    proj_str: String,
}

impl SpatialReference {
    pub fn from_proj(projection: &str) -> Result<Self> {
        let projection = projection.trim();
        if projection.is_empty() {
            return Err(Error::InvalidArgument("Empty projection string".into()));
        }

        if !projection.starts_with('+') {
            return Err(Error::InvalidArgument(format!("Invalid proj string: '{projection}'")));
        }

        Ok(Self {
            srs: parse_proj(projection)?,
            proj_str: projection.to_string(),
            epsg: None,
        })
    }

    pub fn from_epsg(epsg: Epsg) -> Result<Self> {
        let proj_str = crs_definitions::from_code(epsg.code())
            .map(|def| def.proj4.to_string())
            .ok_or_else(|| Error::Runtime(format!("Failed to generate Proj4 string for EPSG code {epsg}")))?;

        Ok(Self {
            srs: parse_proj(&proj_str)?,
            proj_str,
            epsg: Some(epsg),
        })
    }

    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let wkt = wkt.trim();
        if let Some(epsg) = root_authority_epsg(wkt) {
            // The EPSG definition gives results closer to osgeo/proj than the converted WKT
            return Self::from_epsg(epsg);
        }

        let proj_str = wkt_to_projstring(wkt).map_err(|e| Error::InvalidArgument(format!("Failed to parse WKT string ({e})")))?;
        Self::from_proj(&proj_str)
    }

    /// Accepts EPSG codes (`26916` or `EPSG:26916`), proj strings and WKT definitions
    pub fn from_definition(def: &str) -> Result<Self> {
        let def = def.trim();
        if let Some(epsg) = Epsg::from_definition(def).or_else(|| def.parse::<u16>().ok().map(Epsg::from)) {
            Self::from_epsg(epsg)
        } else if is_wkt_string(def) {
            Self::from_wkt(def)
        } else {
            Self::from_proj(def)
        }
    }

    /// Reads the projection file that accompanies a shapefile.
    /// When `path` points to another file of the shapefile set (e.g. the `.shp`), the `.prj` sibling is used.
    pub fn from_prj_file(path: &Path) -> Result<Self> {
        let is_prj = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("prj"));
        let prj_path = if is_prj { path.to_path_buf() } else { path.with_extension("prj") };

        if !prj_path.is_file() {
            return Err(Error::InvalidPath(prj_path));
        }

        let wkt = std::fs::read_to_string(&prj_path)?;
        Self::from_wkt(&wkt)
    }

    pub fn to_proj(&self) -> &str {
        &self.proj_str
    }

    pub fn is_projected(&self) -> bool {
        self.srs.projection_type() != ProjType::Latlong
    }

    pub fn is_geographic(&self) -> bool {
        self.srs.projection_type() == ProjType::Latlong
    }

    pub fn epsg_cs(&self) -> Option<Epsg> {
        self.epsg
    }

    pub fn length_units(&self) -> LengthUnit {
        if self.is_geographic() {
            return LengthUnit::Degrees;
        }

        let params = proj_params(&self.proj_str);
        if let Some(unit) = params.get("units").and_then(|u| u.as_deref()).and_then(LengthUnit::from_proj_units) {
            return unit;
        }

        match params.get("to_meter").and_then(|f| f.as_deref()).and_then(|f| f.parse::<f64>().ok()) {
            Some(factor) => LengthUnit::from_meter_factor(factor),
            // proj defaults to meters
            None => LengthUnit::Meters,
        }
    }
}

impl PartialEq for SpatialReference {
    fn eq(&self, other: &Self) -> bool {
        proj_params(&self.proj_str) == proj_params(&other.proj_str)
    }
}

impl std::fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.epsg {
            Some(epsg) => write!(f, "{epsg}"),
            None => write!(f, "{}", self.proj_str),
        }
    }
}

/// The datum shift grids (e.g. for NAD27) are not available, such definitions are parsed without their datum.
/// Only the projection of the parsed definition is used, the datum is kept in the proj string.
fn parse_proj(proj_str: &str) -> Result<Proj> {
    match Proj::from_proj_string(proj_str) {
        Err(proj4rs::errors::Error::NadGridNotAvailable) => {
            let without_grids = proj_str
                .split_whitespace()
                .filter(|param| !GRID_PROJ_PARAMS.iter().any(|grid_param| param.starts_with(grid_param)))
                .collect::<Vec<_>>()
                .join(" ");
            log::debug!("No datum shift grids for '{proj_str}', using '{without_grids}'");
            Ok(Proj::from_proj_string(&without_grids)?)
        }
        proj => Ok(proj?),
    }
}

fn proj_params(proj_str: &str) -> BTreeMap<String, Option<String>> {
    proj_str
        .split_whitespace()
        .filter_map(|token| token.strip_prefix('+'))
        .map(|param| match param.split_once('=') {
            Some((key, value)) => (key.to_lowercase(), Some(value.to_string())),
            None => (param.to_lowercase(), None),
        })
        .filter(|(key, _)| !IGNORED_PROJ_PARAMS.contains(&key.as_str()))
        .collect()
}

const WKT_ROOTS: [&str; 7] = ["GEOGCS[", "PROJCS[", "GEOCCS[", "VERT_CS[", "LOCAL_CS[", "COMPD_CS[", "FITTED_C["];
const WKT2_ROOTS: [&str; 9] = [
    "GEODCRS[",
    "GEOGCRS[",
    "PROJCRS[",
    "VERTCRS[",
    "ENGCRS[",
    "COMPOUNDCRS[",
    "BOUNDCRS[",
    "PARAMETRICCRS[",
    "TIMECRS[",
];

fn is_wkt_string(s: &str) -> bool {
    WKT_ROOTS.iter().any(|&root| s.starts_with(root)) || WKT2_ROOTS.iter().any(|&root| s.starts_with(root))
}

/// The EPSG code of the authority node of the WKT root element (depth 1), if any
fn root_authority_epsg(wkt: &str) -> Option<Epsg> {
    let mut depth = 0usize;
    let mut authority = None;

    for (pos, c) in wkt.char_indices() {
        match c {
            '[' | '(' => {
                if depth == 1 {
                    let head = &wkt[..pos];
                    let keyword_start = head.rfind([',', '[', '(']).map_or(0, |i| i + 1);
                    let keyword = head[keyword_start..].trim();
                    if keyword.eq_ignore_ascii_case("AUTHORITY") || keyword.eq_ignore_ascii_case("ID") {
                        authority = Some(pos + 1);
                    }
                }
                depth += 1;
            }
            ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    let start = authority?;
    let end = start + wkt[start..].find([']', ')'])?;
    let mut parts = wkt[start..end].split(',').map(|p| p.trim().trim_matches('"'));
    let name = parts.next()?;
    if !name.eq_ignore_ascii_case("EPSG") {
        return None;
    }

    parts.next()?.parse::<u16>().ok().map(Epsg::from)
}
