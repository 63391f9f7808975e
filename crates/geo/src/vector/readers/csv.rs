use crate::vector::VectorFormat;
use crate::vector::dataframe::{DataFrameOptions, DataFrameReader, DataFrameRow, Field, FieldInfo, FieldType, Schema};
use crate::{Error, Result};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::io::BufReader;
use std::path::Path;

const DEFAULT_DATA_TYPE_DETECTION_ROWS: usize = 10;

pub struct CsvReader {
    file_path: std::path::PathBuf,
    delimiter: u8,
}

impl CsvReader {
    fn create_reader(&self) -> Result<Reader<BufReader<std::fs::File>>> {
        let file = std::fs::File::open(&self.file_path).map_err(|e| {
            Error::Runtime(format!("Failed to open '{}' ({e})", self.file_path.display()))
        })?;

        Ok(ReaderBuilder::new()
            .has_headers(false) // Headers are handled manually
            .delimiter(self.delimiter)
            .from_reader(BufReader::new(file)))
    }

    fn infer_column_type(records: &[StringRecord], col_idx: usize) -> FieldType {
        let mut has_int = false;
        let mut has_float = false;
        let mut has_string = false;
        let mut has_bool = false;

        for record in records {
            if let Some(cell) = record.get(col_idx) {
                let cell = cell.trim();

                if cell.is_empty() {
                    continue;
                }

                if cell.parse::<i64>().is_ok() {
                    has_int = true;
                } else if cell.parse::<f64>().is_ok() {
                    has_float = true;
                } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
                    has_bool = true;
                } else {
                    has_string = true;
                }
            }
        }

        if has_string || (has_bool && (has_int || has_float)) {
            FieldType::String
        } else if has_float {
            FieldType::Float
        } else if has_int {
            FieldType::Integer
        } else if has_bool {
            FieldType::Boolean
        } else {
            FieldType::String // Default fallback
        }
    }

    fn sample_records(&self, skip: usize, max_records: usize) -> Result<Vec<StringRecord>> {
        let mut reader = self.create_reader()?;
        let mut records = Vec::new();

        for result in reader.records().skip(skip).take(max_records) {
            records.push(result?);
        }

        Ok(records)
    }

    fn header_record(&self, header_index: usize) -> Result<StringRecord> {
        let mut reader = self.create_reader()?;
        match reader.records().nth(header_index) {
            Some(record) => Ok(record?),
            None => Err(Error::Runtime(format!(
                "Header row {header_index} not present in '{}'",
                self.file_path.display()
            ))),
        }
    }
}

pub struct CsvRowIterator {
    records: csv::StringRecordsIntoIter<BufReader<std::fs::File>>,
    field_types: Vec<FieldType>,
}

impl CsvRowIterator {
    /// Values that do not match the column type are kept as strings, typed reads report them as invalid.
    /// String values are kept as they are, only numbers and booleans are trimmed before parsing.
    fn convert_string_to_field(value: &str, expected_type: FieldType) -> Option<Field> {
        if value.is_empty() {
            return None;
        }

        let trimmed = value.trim();
        let field = match expected_type {
            FieldType::String => None,
            FieldType::Integer => trimmed.parse::<i64>().ok().map(Field::Integer),
            FieldType::Float => trimmed.parse::<f64>().ok().map(Field::Float),
            FieldType::Boolean => match trimmed.to_lowercase().as_str() {
                "true" => Some(Field::Boolean(true)),
                "false" => Some(Field::Boolean(false)),
                _ => None,
            },
        };

        Some(field.unwrap_or_else(|| Field::String(value.to_string())))
    }
}

impl Iterator for CsvRowIterator {
    type Item = Result<DataFrameRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };

        let fields = self
            .field_types
            .iter()
            .enumerate()
            .map(|(col_idx, &field_type)| Self::convert_string_to_field(record.get(col_idx).unwrap_or(""), field_type))
            .collect();

        Some(Ok(DataFrameRow { fields }))
    }
}

impl DataFrameReader for CsvReader {
    fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let file_path = file_path.as_ref();
        if !file_path.is_file() {
            return Err(Error::InvalidPath(file_path.to_path_buf()));
        }

        let delimiter = match VectorFormat::guess_from_path(file_path) {
            VectorFormat::Tab => b'\t',
            _ => b',',
        };

        Ok(Self {
            file_path: file_path.to_path_buf(),
            delimiter,
        })
    }

    fn schema(&mut self, options: &DataFrameOptions) -> Result<Schema> {
        let header_record = self.header_record(options.header_row)?;
        let data_records = self.sample_records(options.header_row + 1, DEFAULT_DATA_TYPE_DETECTION_ROWS)?;

        let fields = header_record
            .iter()
            .enumerate()
            .map(|(col_idx, field_name)| {
                FieldInfo::new(field_name.trim().to_string(), Self::infer_column_type(&data_records, col_idx))
            })
            .collect();

        Ok(Schema { fields })
    }

    fn iter_rows(&mut self, options: &DataFrameOptions) -> Result<Box<dyn Iterator<Item = Result<DataFrameRow>>>> {
        let schema = self.schema(options)?;

        let mut records = self.create_reader()?.into_records();
        for _ in 0..=options.header_row {
            if let Some(record) = records.next() {
                record?;
            }
        }

        Ok(Box::new(CsvRowIterator {
            records,
            field_types: schema.fields.iter().map(FieldInfo::field_type).collect(),
        }))
    }
}
