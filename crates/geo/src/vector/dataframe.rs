use std::path::Path;

use crate::vector::VectorFormat;
use crate::vector::fieldtype::VectorFieldType;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::String(val) => write!(f, "{val}"),
            Field::Integer(val) => write!(f, "{val}"),
            // Debug formatting keeps the decimal point so the value is read back as a float
            Field::Float(val) => write!(f, "{val:?}"),
            Field::Boolean(val) => write!(f, "{val}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    name: String,
    field_type: FieldType,
}

impl FieldInfo {
    pub fn new(name: String, field_type: FieldType) -> Self {
        Self { name, field_type }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Schema {
    pub fields: Vec<FieldInfo>,
}

impl Schema {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldInfo::name)
    }

    /// Index of the field with the given name, the name is matched case-insensitively
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataFrameOptions {
    /// The row to use as a header row, 0-indexed, all preceding rows are ignored
    pub header_row: usize,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct DataFrameRow {
    pub fields: Vec<Option<Field>>,
}

impl DataFrameRow {
    pub fn new(fields: Vec<Option<Field>>) -> Self {
        Self { fields }
    }

    pub fn field(&self, index: usize) -> Result<Option<&Field>> {
        self.fields
            .get(index)
            .map(Option::as_ref)
            .ok_or_else(|| Error::InvalidArgument(format!("Field index out of range: {index}")))
    }

    /// Reads the field at `index` as the requested type, empty fields are `None`
    pub fn read<T: VectorFieldType>(&self, index: usize) -> Result<Option<T>> {
        match self.field(index)? {
            Some(Field::String(val)) if !T::EMPTY_FIELD_IS_VALID && val.trim().is_empty() => Ok(None),
            Some(field) => T::read_from_field(field),
            None => Ok(None),
        }
    }
}

pub trait DataFrameReader {
    fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self>
    where
        Self: Sized;
    fn schema(&mut self, options: &DataFrameOptions) -> Result<Schema>;
    fn iter_rows(&mut self, options: &DataFrameOptions) -> Result<Box<dyn Iterator<Item = Result<DataFrameRow>>>>;
}

pub fn create_dataframe_reader(path: &Path) -> Result<Box<dyn DataFrameReader>> {
    match VectorFormat::guess_from_path(path) {
        #[cfg(feature = "vector-io-csv")]
        VectorFormat::Csv | VectorFormat::Tab => Ok(Box::new(crate::vector::readers::CsvReader::from_file(path)?)),
        format => Err(Error::Runtime(format!(
            "Unsupported table format ({format:?}) for '{}', export the table to csv first",
            path.display()
        ))),
    }
}

/// An in-memory table: a schema and the rows that follow it
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DataFrame {
    schema: Schema,
    rows: Vec<DataFrameRow>,
}

impl DataFrame {
    pub fn new(schema: Schema, rows: Vec<DataFrameRow>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.fields.len() != schema.len()) {
            return Err(Error::InvalidArgument(format!(
                "Row has {} fields, the schema has {}",
                row.fields.len(),
                schema.len()
            )));
        }

        Ok(Self { schema, rows })
    }

    pub fn read(path: &Path, options: &DataFrameOptions) -> Result<Self> {
        let mut reader = create_dataframe_reader(path)?;
        let schema = reader.schema(options)?;

        let rows = reader
            .iter_rows(options)?
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::Runtime(format!("Failed to read rows from '{}': {e}", path.display())))?;

        log::debug!("Read {} rows with {} fields from {}", rows.len(), schema.len(), path.display());
        Self::new(schema, rows)
    }

    pub fn write(&self, path: &Path) -> Result {
        match VectorFormat::guess_from_path(path) {
            #[cfg(feature = "vector-io-csv")]
            VectorFormat::Csv | VectorFormat::Tab => crate::vector::writers::CsvWriter::for_path(path).write(self, path),
            format => Err(Error::Runtime(format!(
                "Unsupported output table format ({format:?}) for '{}'",
                path.display()
            ))),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[DataFrameRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DataFrameRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Create a new data frame with the same schema containing the rows at the given indices (in the given order)
    pub fn select_rows(&self, indices: impl IntoIterator<Item = usize>) -> Result<DataFrame> {
        let rows = indices
            .into_iter()
            .map(|idx| {
                self.rows
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| Error::InvalidArgument(format!("Row index out of range: {idx}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DataFrame {
            schema: self.schema.clone(),
            rows,
        })
    }

    /// Append a column, `values` must contain a value for every row
    pub fn add_column(&mut self, field: FieldInfo, values: Vec<Option<Field>>) -> Result {
        if self.schema.field_index(field.name()).is_some() {
            return Err(Error::InvalidArgument(format!("Field already exists: {}", field.name())));
        }

        if values.len() != self.rows.len() {
            return Err(Error::InvalidArgument(format!(
                "Column '{}' has {} values, the data frame has {} rows",
                field.name(),
                values.len(),
                self.rows.len()
            )));
        }

        self.schema.fields.push(field);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.fields.push(value);
        }

        Ok(())
    }
}
