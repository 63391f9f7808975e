use thiserror::Error;

use crate::records::TableKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Malformed record in {table} table (row {row}): {reason}")]
    MalformedRecord { table: TableKind, row: usize, reason: String },
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Error: {0}")]
    GeoError(#[from] geo::Error),
}
