#[cfg(feature = "vector-io-csv")]
mod csv;

#[cfg(feature = "vector-io-csv")]
pub use self::csv::CsvWriter;
