//! Planimetric attributes of line geometries stored as WKT

use geo_types::{Geometry, LineString};
use geozero::ToGeo;
use geozero::wkt::Wkt;

use crate::{Error, Point, Result};

/// First point, last point and planimetric length of a line geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub start: Point,
    pub end: Point,
    pub length: f64,
}

fn line_string_length(line_string: &LineString<f64>) -> f64 {
    line_string.lines().map(|line| line.dx().hypot(line.dy())).sum()
}

impl LineMetrics {
    pub fn from_geometry(geometry: &Geometry<f64>) -> Result<Self> {
        match geometry {
            Geometry::Line(line) => Ok(LineMetrics {
                start: line.start_point(),
                end: line.end_point(),
                length: line.dx().hypot(line.dy()),
            }),
            Geometry::LineString(line_string) => Self::from_parts(std::slice::from_ref(line_string)),
            Geometry::MultiLineString(multi) => Self::from_parts(&multi.0),
            _ => Err(Error::InvalidGeometry(format!(
                "Expected a line geometry, got {}",
                geometry_type_name(geometry)
            ))),
        }
    }

    /// The start is the first point of the first part, the end the last point of the last part
    fn from_parts(parts: &[LineString<f64>]) -> Result<Self> {
        let start = parts.iter().find_map(|part| part.0.first());
        let end = parts.iter().rev().find_map(|part| part.0.last());

        match (start, end) {
            (Some(start), Some(end)) => Ok(LineMetrics {
                start: Point::from(*start),
                end: Point::from(*end),
                length: parts.iter().map(line_string_length).sum(),
            }),
            _ => Err(Error::InvalidGeometry("Empty line geometry".into())),
        }
    }

    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let geometry = Wkt(wkt)
            .to_geo()
            .map_err(|e| Error::InvalidGeometry(format!("Failed to parse WKT '{wkt}' ({e})")))?;
        Self::from_geometry(&geometry)
    }
}

fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_string_metrics() -> Result<()> {
        let metrics = LineMetrics::from_wkt("LINESTRING (0 0, 3 4, 3 10)")?;
        assert_eq!(metrics.start, Point::new(0.0, 0.0));
        assert_eq!(metrics.end, Point::new(3.0, 10.0));
        assert_relative_eq!(metrics.length, 11.0);
        Ok(())
    }

    #[test]
    fn multi_line_string_metrics() -> Result<()> {
        let metrics = LineMetrics::from_wkt("MULTILINESTRING ((0 0, 0 2), (5 5, 8 9))")?;
        assert_eq!(metrics.start, Point::new(0.0, 0.0));
        assert_eq!(metrics.end, Point::new(8.0, 9.0));
        assert_relative_eq!(metrics.length, 7.0);
        Ok(())
    }

    #[test]
    fn non_line_geometries_are_rejected() {
        assert!(LineMetrics::from_wkt("POINT (1 1)").is_err());
        assert!(LineMetrics::from_wkt("POLYGON ((0 0, 0 1, 1 1, 0 0))").is_err());
        assert!(LineMetrics::from_wkt("not wkt").is_err());
    }
}
