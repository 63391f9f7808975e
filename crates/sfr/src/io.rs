//! Reading the cleanup records from the input tables and writing the retained rows back.

use std::path::{Path, PathBuf};

use geo::vector::geometry::LineMetrics;
use geo::vector::{DataFrame, DataFrameOptions, DataFrameRow, Field, FieldInfo, FieldType};

use crate::cleanup::{CleanupInput, CleanupOutput, CleanupReport, ReachCleanup};
use crate::config::{ConnectivityCheck, MalformedRecordPolicy, SetupConfig};
use crate::fieldmapping::{self, FieldSpec};
use crate::records::{CellId, CellRecord, MalformedRecord, ReachRecord, SegmentId, SegmentRecord, TableKind, id_string};
use crate::{Error, Result};

/// Columns appended to a reach table that has a geometry but no length column
pub const GEOMETRY_COLUMNS: [&str; 5] = ["X_start", "Y_start", "X_end", "Y_end", "LengthFt"];

/// An input table and the records read from it
#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    pub path: PathBuf,
    pub frame: DataFrame,
    pub records: Vec<T>,
    pub malformed: Vec<MalformedRecord>,
}

type RecordResult<T> = std::result::Result<T, String>;

fn read_frame(path: &Path) -> Result<DataFrame> {
    DataFrame::read(path, &DataFrameOptions::default()).map_err(|e| {
        Error::Configuration(format!("Failed to read table '{}' ({e})", path.display()))
    })
}

fn read_id(row: &DataFrameRow, index: usize, spec: &FieldSpec) -> RecordResult<String> {
    match row.field(index).map_err(|e| e.to_string())? {
        Some(field) => {
            let id = id_string(field);
            if id.is_empty() {
                Err(format!("missing {}", spec.name))
            } else {
                Ok(id)
            }
        }
        None => Err(format!("missing {}", spec.name)),
    }
}

fn read_optional_number(row: &DataFrameRow, index: usize, spec: &FieldSpec) -> RecordResult<Option<f64>> {
    match row.read::<f64>(index) {
        Ok(Some(val)) if !val.is_finite() => Err(format!("{} is not a finite number ({val})", spec.name)),
        Ok(val) => Ok(val),
        Err(e) => Err(format!("invalid {} ({e})", spec.name)),
    }
}

fn read_number(row: &DataFrameRow, index: usize, spec: &FieldSpec) -> RecordResult<f64> {
    read_optional_number(row, index, spec)?.ok_or_else(|| format!("missing {}", spec.name))
}

/// Turns every row into a record, rows that can't be converted are handled according to `policy`
fn collect_records<T>(
    frame: &DataFrame,
    table: TableKind,
    policy: MalformedRecordPolicy,
    mut to_record: impl FnMut(usize, &DataFrameRow) -> RecordResult<T>,
) -> Result<(Vec<T>, Vec<MalformedRecord>)> {
    let mut records = Vec::with_capacity(frame.len());
    let mut malformed = Vec::new();

    for (index, row) in frame.rows().iter().enumerate() {
        match to_record(index, row) {
            Ok(record) => records.push(record),
            Err(reason) => {
                let record = MalformedRecord { table, row: index, reason };
                match policy {
                    MalformedRecordPolicy::Abort => return Err(record.into()),
                    MalformedRecordPolicy::Skip => {
                        log::warn!("Skipping malformed record: {record}");
                        malformed.push(record);
                    }
                }
            }
        }
    }

    Ok((records, malformed))
}

pub fn read_segments(path: &Path, frame: DataFrame, policy: MalformedRecordPolicy) -> Result<Table<SegmentRecord>> {
    let schema = frame.schema();
    let id_col = fieldmapping::require_field(schema, &fieldmapping::SEGMENT_ID, "segment")?;
    let elevation_col = fieldmapping::require_field(schema, &fieldmapping::ELEVATION_MAX, "segment")?;
    let thinning_col = fieldmapping::require_field(schema, &fieldmapping::THINNING_CODE, "segment")?;

    let (records, malformed) = collect_records(&frame, TableKind::Segments, policy, |index, row| {
        Ok(SegmentRecord {
            row: index,
            segment_id: SegmentId::from(read_id(row, id_col, &fieldmapping::SEGMENT_ID)?),
            elevation_max: read_number(row, elevation_col, &fieldmapping::ELEVATION_MAX)?,
            thinning_code: read_number(row, thinning_col, &fieldmapping::THINNING_CODE)?,
        })
    })?;

    Ok(Table {
        path: path.to_path_buf(),
        frame,
        records,
        malformed,
    })
}

/// Appends the start and end coordinates and the length of the reach geometries to the table.
/// Returns the index of the length column and the geometry errors per row.
fn add_geometry_columns(frame: &mut DataFrame, geometry_col: usize) -> Result<(usize, Vec<Option<String>>)> {
    let metrics: Vec<RecordResult<LineMetrics>> = frame
        .rows()
        .iter()
        .map(|row| match row.field(geometry_col) {
            Ok(Some(Field::String(wkt))) => LineMetrics::from_wkt(wkt).map_err(|e| e.to_string()),
            Ok(_) => Err("missing geometry".to_string()),
            Err(e) => Err(e.to_string()),
        })
        .collect();

    let values = |value: fn(&LineMetrics) -> f64| -> Vec<Option<Field>> {
        metrics
            .iter()
            .map(|m| m.as_ref().ok().map(|m| Field::Float(value(m))))
            .collect()
    };

    let [x_start, y_start, x_end, y_end, length] = GEOMETRY_COLUMNS;
    let columns: [(&str, Vec<Option<Field>>); 5] = [
        (x_start, values(|m| m.start.x())),
        (y_start, values(|m| m.start.y())),
        (x_end, values(|m| m.end.x())),
        (y_end, values(|m| m.end.y())),
        (length, values(|m| m.length)),
    ];

    for (name, column) in columns {
        frame.add_column(FieldInfo::new(name.to_string(), FieldType::Float), column)?;
    }

    let errors = metrics.into_iter().map(|m| m.err()).collect();
    Ok((frame.schema().len() - 1, errors))
}

pub fn read_reaches(path: &Path, mut frame: DataFrame, policy: MalformedRecordPolicy) -> Result<Table<ReachRecord>> {
    let schema = frame.schema();
    let id_col = fieldmapping::require_field(schema, &fieldmapping::SEGMENT_ID, "reach")?;
    let cell_col = fieldmapping::require_field(schema, &fieldmapping::CELL_ID, "reach")?;
    let elevation_col = fieldmapping::resolve_field(schema, &fieldmapping::ELEVATION_MAX)?;
    let thinning_col = fieldmapping::resolve_field(schema, &fieldmapping::THINNING_CODE)?;

    let (length_col, geometry_errors) = match fieldmapping::resolve_field(schema, &fieldmapping::LENGTH)? {
        Some(col) => (col, Vec::new()),
        None => match fieldmapping::resolve_field(schema, &fieldmapping::GEOMETRY)? {
            Some(geometry_col) => {
                log::info!("No length column in the reach table, using the lengths of the reach geometries");
                add_geometry_columns(&mut frame, geometry_col)?
            }
            None => {
                // reports the missing length column
                (fieldmapping::require_field(schema, &fieldmapping::LENGTH, "reach")?, Vec::new())
            }
        },
    };

    let (records, malformed) = collect_records(&frame, TableKind::Reaches, policy, |index, row| {
        if let Some(Some(err)) = geometry_errors.get(index) {
            return Err(format!("invalid geometry ({err})"));
        }

        let length = read_number(row, length_col, &fieldmapping::LENGTH)?;
        if length < 0.0 {
            return Err(format!("negative length ({length})"));
        }

        Ok(ReachRecord {
            row: index,
            segment_id: SegmentId::from(read_id(row, id_col, &fieldmapping::SEGMENT_ID)?),
            cell_id: CellId::from(read_id(row, cell_col, &fieldmapping::CELL_ID)?),
            length,
            elevation_max: match elevation_col {
                Some(col) => read_optional_number(row, col, &fieldmapping::ELEVATION_MAX)?,
                None => None,
            },
            thinning_code: match thinning_col {
                Some(col) => read_optional_number(row, col, &fieldmapping::THINNING_CODE)?,
                None => None,
            },
        })
    })?;

    Ok(Table {
        path: path.to_path_buf(),
        frame,
        records,
        malformed,
    })
}

pub fn read_cells(path: &Path, frame: DataFrame, policy: MalformedRecordPolicy) -> Result<Table<CellRecord>> {
    let cell_col = fieldmapping::require_field(frame.schema(), &fieldmapping::CELL_ID, "cell")?;

    let (records, malformed) = collect_records(&frame, TableKind::Cells, policy, |index, row| {
        Ok(CellRecord {
            row: index,
            cell_id: CellId::from(read_id(row, cell_col, &fieldmapping::CELL_ID)?),
        })
    })?;

    Ok(Table {
        path: path.to_path_buf(),
        frame,
        records,
        malformed,
    })
}

/// The input tables of a cleanup run
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupTables {
    pub segments: Option<Table<SegmentRecord>>,
    pub reaches: Table<ReachRecord>,
    pub cells: Table<CellRecord>,
}

impl CleanupTables {
    /// Reads all the tables, nothing is filtered before every table was read and mapped
    pub fn read(setup: &SetupConfig) -> Result<Self> {
        let policy = setup.cleanup.malformed_records;

        let segments = match &setup.segments {
            Some(path) => Some(read_segments(path, read_frame(path)?, policy)?),
            None => None,
        };

        let reaches = read_reaches(&setup.reaches, read_frame(&setup.reaches)?, policy)?;
        if setup.cleanup.connectivity_check == ConnectivityCheck::ElevationProxy
            && fieldmapping::resolve_field(reaches.frame.schema(), &fieldmapping::ELEVATION_MAX)?.is_none()
        {
            return Err(Error::Configuration(format!(
                "The {} connectivity check needs an elevation column in the reach table, use {} instead",
                ConnectivityCheck::ElevationProxy,
                ConnectivityCheck::ReachCount
            )));
        }

        let cells = read_cells(&setup.cells, read_frame(&setup.cells)?, policy)?;

        log::info!(
            "Read {} reaches and {} cells{}",
            reaches.records.len(),
            cells.records.len(),
            segments
                .as_ref()
                .map(|seg| format!(" and {} segments", seg.records.len()))
                .unwrap_or_default()
        );

        Ok(CleanupTables { segments, reaches, cells })
    }

    pub fn to_input(&self) -> CleanupInput {
        let mut malformed = Vec::new();
        if let Some(segments) = &self.segments {
            malformed.extend(segments.malformed.iter().cloned());
        }
        malformed.extend(self.reaches.malformed.iter().cloned());
        malformed.extend(self.cells.malformed.iter().cloned());

        CleanupInput {
            segments: self.segments.as_ref().map(|table| table.records.clone()),
            reaches: self.reaches.records.clone(),
            cells: self.cells.records.clone(),
            malformed,
        }
    }

    /// Writes the rows of the retained records to `output_dir`, using the file names of the input tables.
    /// The tables are first written to temporary files that are only renamed when all tables were written.
    pub fn write(&self, output: &CleanupOutput, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut frames = Vec::with_capacity(3);
        if let (Some(table), Some(segments)) = (&self.segments, &output.segments) {
            let frame = table.frame.select_rows(segments.iter().map(|seg| seg.row))?;
            frames.push((table.path.as_path(), frame));
        }

        let reaches = self.reaches.frame.select_rows(output.reaches.iter().map(|reach| reach.row))?;
        frames.push((self.reaches.path.as_path(), reaches));
        let cells = self.cells.frame.select_rows(output.cells.iter().map(|cell| cell.row))?;
        frames.push((self.cells.path.as_path(), cells));

        write_frames(&frames, output_dir)
    }
}

fn output_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let file_name = input
        .file_name()
        .ok_or_else(|| Error::Configuration(format!("Not a table path: '{}'", input.display())))?;
    Ok(output_dir.join(file_name))
}

/// The temporary file keeps the extension so the table format is preserved
fn temporary_path(path: &Path) -> PathBuf {
    let file_name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    path.with_file_name(format!(".tmp-{file_name}"))
}

fn write_frames(frames: &[(&Path, DataFrame)], output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(frames.len());
    for (input, frame) in frames {
        let path = output_path(input, output_dir)?;
        let tmp = temporary_path(&path);
        written.push((tmp.clone(), path));

        if let Err(e) = frame.write(&tmp) {
            for (tmp, _) in &written {
                let _ = std::fs::remove_file(tmp);
            }

            return Err(e.into());
        }
    }

    let mut paths = Vec::with_capacity(written.len());
    for (index, (tmp, path)) in written.iter().enumerate() {
        if let Err(e) = std::fs::rename(tmp, path) {
            // remove the tables that were already moved in place and the remaining temporary files
            for renamed in &paths {
                let _ = std::fs::remove_file(renamed);
            }
            for (tmp, _) in &written[index..] {
                let _ = std::fs::remove_file(tmp);
            }

            return Err(Error::IOError(e));
        }

        paths.push(path.clone());
    }

    for path in &paths {
        log::info!("Wrote {}", path.display());
    }

    Ok(paths)
}

/// Reads the tables of the setup, runs the cleanup and writes the retained rows to the output directory
pub fn run(setup: &SetupConfig) -> Result<CleanupReport> {
    let tables = CleanupTables::read(setup)?;
    let output = ReachCleanup::new(setup.cleanup).run(tables.to_input())?;
    tables.write(&output, &setup.output_dir)?;
    Ok(output.report)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::vector::Schema;

    use super::*;

    fn frame(names: &[&str], rows: Vec<Vec<Option<Field>>>) -> DataFrame {
        let schema = Schema {
            fields: names
                .iter()
                .map(|name| FieldInfo::new(name.to_string(), FieldType::String))
                .collect(),
        };

        DataFrame::new(schema, rows.into_iter().map(DataFrameRow::new).collect()).expect("valid data frame")
    }

    fn int(val: i64) -> Option<Field> {
        Some(Field::Integer(val))
    }

    fn float(val: f64) -> Option<Field> {
        Some(Field::Float(val))
    }

    fn text(val: &str) -> Option<Field> {
        Some(Field::String(val.to_string()))
    }

    #[test_log::test]
    fn segment_records() -> Result<()> {
        let df = frame(
            &["FID", "COMID", "MAXELEVSMO", "ThinnerCod"],
            vec![
                vec![int(0), int(13294), float(310.2), int(1)],
                vec![int(1), float(13295.0), int(0), int(-9)],
            ],
        );

        let table = read_segments(Path::new("flowlines.csv"), df, MalformedRecordPolicy::Skip)?;
        assert!(table.malformed.is_empty());
        assert_eq!(
            table.records[1],
            SegmentRecord {
                row: 1,
                segment_id: SegmentId::from("13295"),
                elevation_max: 0.0,
                thinning_code: -9.0,
            }
        );
        Ok(())
    }

    #[test_log::test]
    fn malformed_records_are_never_filter_decisions() -> Result<()> {
        let df = frame(
            &["comid", "maxelevsmo", "thinnercod"],
            vec![
                vec![int(1), float(310.0), int(1)],
                vec![int(2), None, int(1)],
                vec![int(3), text("n/a"), int(1)],
                vec![int(4), float(300.0), text("")],
            ],
        );

        let table = read_segments(Path::new("flowlines.csv"), df.clone(), MalformedRecordPolicy::Skip)?;
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.malformed.iter().map(|m| m.row).collect::<Vec<_>>(), [1, 2, 3]);
        assert!(table.malformed[1].reason.contains("elevation_max"));
        assert!(table.malformed[2].reason.contains("missing thinning_code"));

        let err = read_segments(Path::new("flowlines.csv"), df, MalformedRecordPolicy::Abort).expect_err("aborts");
        assert!(matches!(
            err,
            Error::MalformedRecord {
                table: TableKind::Segments,
                row: 1,
                ..
            }
        ));
        Ok(())
    }

    #[test_log::test]
    fn reach_attributes_are_optional() -> Result<()> {
        let df = frame(
            &["comid", "node", "LengthFt"],
            vec![vec![int(1), int(10), float(5.0)], vec![int(1), int(11), text("x")]],
        );

        let table = read_reaches(Path::new("river_explode.csv"), df, MalformedRecordPolicy::Skip)?;
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].elevation_max, None);
        assert_eq!(table.records[0].thinning_code, None);
        assert_eq!(table.malformed[0].table, TableKind::Reaches);
        Ok(())
    }

    #[test_log::test]
    fn negative_length_is_malformed() -> Result<()> {
        let df = frame(&["comid", "node", "length"], vec![vec![int(1), int(10), float(-1.0)]]);
        let table = read_reaches(Path::new("river_explode.csv"), df, MalformedRecordPolicy::Skip)?;
        assert!(table.records.is_empty());
        assert!(table.malformed[0].reason.contains("negative length"));
        Ok(())
    }

    #[test_log::test]
    fn reach_lengths_from_geometry() -> Result<()> {
        let df = frame(
            &["WKT", "comid", "node"],
            vec![
                vec![text("LINESTRING (0 0, 30 40)"), int(1), int(10)],
                vec![text("POINT (1 1)"), int(1), int(11)],
            ],
        );

        let table = read_reaches(Path::new("river_explode.csv"), df, MalformedRecordPolicy::Skip)?;
        let names: Vec<_> = table.frame.schema().field_names().collect();
        assert_eq!(names, ["WKT", "comid", "node", "X_start", "Y_start", "X_end", "Y_end", "LengthFt"]);

        assert_eq!(table.records.len(), 1);
        assert_relative_eq!(table.records[0].length, 50.0);
        assert_eq!(table.frame.rows()[0].read::<f64>(5)?, Some(30.0));
        assert_eq!(table.frame.rows()[1].read::<f64>(7)?, None);
        assert!(table.malformed[0].reason.contains("invalid geometry"));
        Ok(())
    }

    #[test_log::test]
    fn segment_length_is_not_a_reach_length() -> Result<()> {
        let df = frame(
            &["comid", "node", "LENGTHKM", "WKT"],
            vec![vec![int(1), int(10), float(1.42), text("LINESTRING (0 0, 300 400)")]],
        );

        let table = read_reaches(Path::new("river_explode.csv"), df, MalformedRecordPolicy::Skip)?;
        let names: Vec<_> = table.frame.schema().field_names().collect();
        assert_eq!(
            names,
            ["comid", "node", "LENGTHKM", "WKT", "X_start", "Y_start", "X_end", "Y_end", "LengthFt"]
        );
        assert_relative_eq!(table.records[0].length, 500.0);
        Ok(())
    }

    #[test]
    fn missing_length_and_geometry() {
        let df = frame(&["comid", "node"], vec![vec![int(1), int(10)]]);
        let res = read_reaches(Path::new("river_explode.csv"), df, MalformedRecordPolicy::Skip);
        assert!(matches!(res, Err(Error::Configuration(_))));
    }

    #[test]
    fn cell_ids_render_like_reach_ids() -> Result<()> {
        let df = frame(&["node"], vec![vec![float(10.0)], vec![int(11)], vec![None]]);
        let table = read_cells(Path::new("river_cells.csv"), df, MalformedRecordPolicy::Skip)?;
        assert_eq!(table.records[0].cell_id, CellId::from("10"));
        assert_eq!(table.records[1].cell_id, CellId::from("11"));
        assert_eq!(table.malformed.len(), 1);
        Ok(())
    }

    #[test]
    fn temporary_file_keeps_the_extension() {
        let tmp = temporary_path(Path::new("out/river_explode.csv"));
        assert_eq!(tmp, PathBuf::from("out/.tmp-river_explode.csv"));
        assert_eq!(geo::vector::VectorFormat::guess_from_path(&tmp), geo::vector::VectorFormat::Csv);
    }
}
