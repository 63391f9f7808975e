//! Maps the columns of an input table on the canonical fields of the cleanup records.
//!
//! Column names differ between data sources and get suffixes when tables are joined
//! (`COMID`, `comid_1`, `MAXELEVSMO`, ...). Resolution happens once per table:
//! - a column whose name equals one of the candidates (ignoring case) wins
//! - otherwise a single column containing one of the source column names is used
//! - several containing columns are ambiguous and rejected
//!
//! Canonical names like `length` are only matched exactly, `LENGTHKM` is not a reach length.

use geo::vector::Schema;
use itertools::Itertools;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical name used in messages
    pub name: &'static str,
    /// Lowercase column names that identify the field, in order of preference
    pub candidates: &'static [&'static str],
    /// Lowercase source column names that are also recognized inside joined column names
    pub fragments: &'static [&'static str],
}

pub const SEGMENT_ID: FieldSpec = FieldSpec {
    name: "segment_id",
    candidates: &["comid", "segment_id"],
    fragments: &["comid"],
};

pub const CELL_ID: FieldSpec = FieldSpec {
    name: "cell_id",
    candidates: &["node", "cell_id"],
    fragments: &["node"],
};

pub const LENGTH: FieldSpec = FieldSpec {
    name: "length",
    candidates: &["lengthft", "length"],
    fragments: &["lengthft"],
};

pub const ELEVATION_MAX: FieldSpec = FieldSpec {
    name: "elevation_max",
    candidates: &["maxelevsmo", "elevation_max"],
    fragments: &["maxelevsmo"],
};

pub const THINNING_CODE: FieldSpec = FieldSpec {
    name: "thinning_code",
    candidates: &["thinnercod", "thinning_code"],
    fragments: &["thinnercod"],
};

pub const GEOMETRY: FieldSpec = FieldSpec {
    name: "geometry",
    candidates: &["wkt", "geometry"],
    fragments: &["wkt"],
};

/// Index of the column that holds `spec`, `None` when the table has no such column
pub fn resolve_field(schema: &Schema, spec: &FieldSpec) -> Result<Option<usize>> {
    let names: Vec<String> = schema.field_names().map(str::to_lowercase).collect();

    for candidate in spec.candidates {
        if let Some(index) = names.iter().position(|name| name == candidate) {
            return Ok(Some(index));
        }
    }

    let matches: Vec<usize> = names
        .iter()
        .positions(|name| spec.fragments.iter().any(|fragment| name.contains(fragment)))
        .collect();

    match matches.as_slice() {
        [] => Ok(None),
        [index] => {
            log::debug!(
                "Using column '{}' for field {}",
                schema.fields[*index].name(),
                spec.name
            );
            Ok(Some(*index))
        }
        _ => Err(Error::Configuration(format!(
            "Ambiguous columns for field {}: {}",
            spec.name,
            matches.iter().map(|&idx| schema.fields[idx].name()).join(", ")
        ))),
    }
}

pub fn require_field(schema: &Schema, spec: &FieldSpec, table: &str) -> Result<usize> {
    resolve_field(schema, spec)?.ok_or_else(|| {
        Error::Configuration(format!(
            "No column for field {} (any of: {}) in the {table} table, available columns: {}",
            spec.name,
            spec.candidates.join(", "),
            schema.field_names().join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use geo::vector::{FieldInfo, FieldType};

    use super::*;

    fn schema(names: &[&str]) -> Schema {
        Schema {
            fields: names
                .iter()
                .map(|name| FieldInfo::new(name.to_string(), FieldType::String))
                .collect(),
        }
    }

    #[test]
    fn exact_match_is_case_insensitive() -> Result<()> {
        let schema = schema(&["FID", "COMID", "NODE", "LengthFt"]);
        assert_eq!(resolve_field(&schema, &SEGMENT_ID)?, Some(1));
        assert_eq!(resolve_field(&schema, &CELL_ID)?, Some(2));
        assert_eq!(resolve_field(&schema, &LENGTH)?, Some(3));
        Ok(())
    }

    #[test]
    fn exact_match_wins_over_containing_columns() -> Result<()> {
        let schema = schema(&["tocomid", "comid", "lengthkm", "LengthFt"]);
        assert_eq!(resolve_field(&schema, &SEGMENT_ID)?, Some(1));
        assert_eq!(resolve_field(&schema, &LENGTH)?, Some(3));
        Ok(())
    }

    #[test]
    fn joined_column_names_are_found() -> Result<()> {
        let schema = schema(&["river_explode.MAXELEVSMO", "river_cells_dissolve.node_1"]);
        assert_eq!(resolve_field(&schema, &ELEVATION_MAX)?, Some(0));
        assert_eq!(resolve_field(&schema, &CELL_ID)?, Some(1));
        assert_eq!(resolve_field(&schema, &THINNING_CODE)?, None);
        Ok(())
    }

    #[test]
    fn canonical_names_are_not_matched_inside_other_columns() -> Result<()> {
        let reaches = schema(&["comid", "node", "LENGTHKM", "WKT"]);
        assert_eq!(resolve_field(&reaches, &LENGTH)?, None);
        assert_eq!(resolve_field(&reaches, &GEOMETRY)?, Some(3));

        let joined = schema(&["comid", "river_explode.LengthFt", "segment_length"]);
        assert_eq!(resolve_field(&joined, &LENGTH)?, Some(1));
        Ok(())
    }

    #[test]
    fn multiple_containing_columns_are_ambiguous() {
        let schema = schema(&["node_1", "node_2"]);
        assert!(matches!(resolve_field(&schema, &CELL_ID), Err(Error::Configuration(_))));
    }

    #[test]
    fn missing_required_field() {
        let schema = schema(&["FID", "COMID"]);
        let err = require_field(&schema, &CELL_ID, "reaches").expect_err("node column is missing");
        assert!(err.to_string().contains("cell_id"));
        assert!(err.to_string().contains("COMID"));
    }
}
