//! Vector data handling: tables with typed fields and line geometry attributes.

pub mod dataframe;
pub mod fieldtype;
#[cfg(feature = "vector-geometry")]
pub mod geometry;
pub mod readers;
pub mod writers;

#[doc(inline)]
pub use dataframe::{DataFrame, DataFrameOptions, DataFrameRow, Field, FieldInfo, FieldType, Schema};
#[doc(inline)]
pub use fieldtype::VectorFieldType;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VectorFormat {
    Csv,
    Tab,
    ShapeFile,
    GeoJson,
    GeoPackage,
    Unknown,
}

impl VectorFormat {
    /// Given a file path, guess the vector type based on the file extension
    pub fn guess_from_path(file_path: &std::path::Path) -> VectorFormat {
        let ext = file_path.extension().map(|ext| ext.to_string_lossy().to_lowercase());

        match ext.as_deref() {
            Some("csv") => VectorFormat::Csv,
            Some("tab" | "tsv") => VectorFormat::Tab,
            Some("shp" | "dbf") => VectorFormat::ShapeFile,
            Some("json" | "geojson") => VectorFormat::GeoJson,
            Some("gpkg") => VectorFormat::GeoPackage,
            _ => VectorFormat::Unknown,
        }
    }
}
