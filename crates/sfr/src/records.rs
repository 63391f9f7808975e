//! The records the cleanup pass operates on.
//!
//! Records are created once when the input tables are read and are never modified afterwards,
//! the pass only decides which of them are retained. `row` refers to the data row of the
//! source table so retained records can be written back with all their original columns.

use geo::vector::Field;

/// Identifier of a flowline segment (`COMID`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentId(String);

/// Identifier of a model grid cell (`node`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId(String);

macro_rules! string_id {
    ($id:ident) => {
        impl $id {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $id {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $id {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<i64> for $id {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl std::fmt::Display for $id {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(SegmentId);
string_id!(CellId);

/// Renders a table value as an identifier, integral floats lose their decimal point (`10.0` -> `10`)
pub fn id_string(field: &Field) -> String {
    match field {
        Field::Float(val) if val.fract() == 0.0 && val.abs() < i64::MAX as f64 => format!("{}", *val as i64),
        Field::String(val) => val.trim().to_string(),
        field => field.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableKind {
    Segments,
    Reaches,
    Cells,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Segments => write!(f, "segment"),
            TableKind::Reaches => write!(f, "reach"),
            TableKind::Cells => write!(f, "cell"),
        }
    }
}

/// A flowline segment before it was exploded into reaches
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentRecord {
    pub row: usize,
    pub segment_id: SegmentId,
    /// Maximum smoothed elevation, 0 marks a segment without elevation data
    pub elevation_max: f64,
    /// Thinning code, -9 marks a segment removed by network thinning
    pub thinning_code: f64,
}

/// The part of a segment that lies within a single model grid cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachRecord {
    pub row: usize,
    pub segment_id: SegmentId,
    pub cell_id: CellId,
    /// Planimetric length in grid length units
    pub length: f64,
    pub elevation_max: Option<f64>,
    pub thinning_code: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRecord {
    pub row: usize,
    pub cell_id: CellId,
}

/// Access to the segment attributes the attribute filter inspects
pub trait FlowlineAttributes {
    fn segment_id(&self) -> &SegmentId;
    fn elevation_max(&self) -> Option<f64>;
    fn thinning_code(&self) -> Option<f64>;
}

impl FlowlineAttributes for SegmentRecord {
    fn segment_id(&self) -> &SegmentId {
        &self.segment_id
    }

    fn elevation_max(&self) -> Option<f64> {
        Some(self.elevation_max)
    }

    fn thinning_code(&self) -> Option<f64> {
        Some(self.thinning_code)
    }
}

impl FlowlineAttributes for ReachRecord {
    fn segment_id(&self) -> &SegmentId {
        &self.segment_id
    }

    fn elevation_max(&self) -> Option<f64> {
        self.elevation_max
    }

    fn thinning_code(&self) -> Option<f64> {
        self.thinning_code
    }
}

/// A table row that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MalformedRecord {
    pub table: TableKind,
    pub row: usize,
    pub reason: String,
}

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} row {}: {}", self.table, self.row, self.reason)
    }
}

impl From<MalformedRecord> for crate::Error {
    fn from(record: MalformedRecord) -> Self {
        crate::Error::MalformedRecord {
            table: record.table,
            row: record.row,
            reason: record.reason,
        }
    }
}
