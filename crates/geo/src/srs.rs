//! Spatial reference system handling

#[cfg(feature = "proj4rs")]
mod proj4rs;

#[cfg(feature = "proj4rs")]
#[cfg_attr(docsrs, doc(cfg(feature = "proj4rs")))]
pub use proj4rs::SpatialReference;

/// Linear unit of the coordinates of a spatial reference
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LengthUnit {
    Meters,
    Feet,
    UsSurveyFeet,
    Degrees,
    /// Any other linear unit, the value is the conversion factor to meters
    Other(f64),
}

const FOOT_TO_METER: f64 = 0.3048;
const US_SURVEY_FOOT_TO_METER: f64 = 1200.0 / 3937.0;

impl LengthUnit {
    /// Maps a proj `+units=` value on a length unit
    pub fn from_proj_units(units: &str) -> Option<LengthUnit> {
        match units {
            "m" => Some(LengthUnit::Meters),
            "ft" => Some(LengthUnit::Feet),
            "us-ft" => Some(LengthUnit::UsSurveyFeet),
            "km" => Some(LengthUnit::Other(1000.0)),
            "cm" => Some(LengthUnit::Other(0.01)),
            "mi" => Some(LengthUnit::Other(1609.344)),
            "us-mi" => Some(LengthUnit::Other(1609.347_218_694_437)),
            _ => None,
        }
    }

    /// Maps a proj `+to_meter=` factor on a length unit
    pub fn from_meter_factor(factor: f64) -> LengthUnit {
        if approx::relative_eq!(factor, 1.0) {
            LengthUnit::Meters
        } else if approx::relative_eq!(factor, FOOT_TO_METER, epsilon = 1e-9) {
            LengthUnit::Feet
        } else if approx::relative_eq!(factor, US_SURVEY_FOOT_TO_METER, epsilon = 1e-9) {
            LengthUnit::UsSurveyFeet
        } else {
            LengthUnit::Other(factor)
        }
    }

    /// Conversion factor to meters, `None` for angular units
    pub fn to_meter(&self) -> Option<f64> {
        match self {
            LengthUnit::Meters => Some(1.0),
            LengthUnit::Feet => Some(FOOT_TO_METER),
            LengthUnit::UsSurveyFeet => Some(US_SURVEY_FOOT_TO_METER),
            LengthUnit::Degrees => None,
            LengthUnit::Other(factor) => Some(*factor),
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthUnit::Meters => write!(f, "meters"),
            LengthUnit::Feet => write!(f, "feet"),
            LengthUnit::UsSurveyFeet => write!(f, "US survey feet"),
            LengthUnit::Degrees => write!(f, "degree"),
            LengthUnit::Other(factor) => write!(f, "units of {factor} m"),
        }
    }
}
