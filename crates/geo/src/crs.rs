//! EPSG code handling

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epsg(u16);

impl Epsg {
    pub const fn new(code: u16) -> Self {
        Epsg(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Parses `EPSG:nnnn` style definitions, the prefix is matched case-insensitively
    pub fn from_definition(def: &str) -> Option<Epsg> {
        let def = def.trim();
        let (prefix, code) = def.split_once(':')?;
        if !prefix.eq_ignore_ascii_case("epsg") {
            return None;
        }

        code.trim().parse::<u16>().ok().map(Epsg)
    }
}

impl From<u16> for Epsg {
    fn from(code: u16) -> Self {
        Epsg(code)
    }
}

impl From<Epsg> for u16 {
    fn from(epsg: Epsg) -> Self {
        epsg.0
    }
}

impl std::fmt::Display for Epsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

pub mod epsg {
    use super::Epsg;

    pub const WGS84: Epsg = Epsg::new(4326);
    pub const NAD83: Epsg = Epsg::new(4269);
    pub const NAD27_UTM_ZONE_15N: Epsg = Epsg::new(26715);
    pub const NAD83_UTM_ZONE_16N: Epsg = Epsg::new(26916);
    pub const NAD83_CONUS_ALBERS: Epsg = Epsg::new(5070);
}
