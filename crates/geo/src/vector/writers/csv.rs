use std::path::Path;

use crate::vector::VectorFormat;
use crate::vector::dataframe::DataFrame;
use crate::{Error, Result};

pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn for_path(path: &Path) -> Self {
        let delimiter = match VectorFormat::guess_from_path(path) {
            VectorFormat::Tab => b'\t',
            _ => b',',
        };

        Self { delimiter }
    }

    /// Writes the header row followed by all the rows, missing values are written as empty fields
    pub fn write(&self, df: &DataFrame, path: &Path) -> Result {
        create_directory_for_file(path)?;

        let mut writer = csv::WriterBuilder::new().delimiter(self.delimiter).from_path(path)?;
        writer.write_record(df.schema().field_names())?;

        for row in df.rows() {
            writer.write_record(
                row.fields
                    .iter()
                    .map(|field| field.as_ref().map(ToString::to_string).unwrap_or_default()),
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn create_directory_for_file(p: &Path) -> Result {
    if let Some(parent_dir) = p.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::Runtime(format!(
                "Failed to create output directory for file '{}' ({e})",
                p.to_string_lossy()
            ))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::dataframe::{DataFrameOptions, DataFrameRow, Field, FieldInfo, FieldType, Schema};

    #[test]
    fn write_and_read_back() -> Result<()> {
        let schema = Schema {
            fields: vec![
                FieldInfo::new("node".into(), FieldType::Integer),
                FieldInfo::new("LengthFt".into(), FieldType::Float),
                FieldInfo::new("WKT".into(), FieldType::String),
            ],
        };

        let df = DataFrame::new(
            schema.clone(),
            vec![
                DataFrameRow::new(vec![
                    Some(Field::Integer(10)),
                    Some(Field::Float(12.0)),
                    Some(Field::String("LINESTRING (0 0, 3 4)".into())),
                ]),
                DataFrameRow::new(vec![Some(Field::Integer(11)), None, None]),
                DataFrameRow::new(vec![Some(Field::Integer(12)), None, Some(Field::String(" LINESTRING (3 4, 6 8) ".into()))]),
            ],
        )?;

        let dir = tempfile::tempdir()?;
        let output = dir.path().join("nested").join("river_explode.csv");
        CsvWriter::for_path(&output).write(&df, &output)?;

        let read_back = DataFrame::read(&output, &DataFrameOptions::default())?;
        assert_eq!(read_back.schema(), &schema);
        assert_eq!(read_back.rows(), df.rows());

        Ok(())
    }
}
