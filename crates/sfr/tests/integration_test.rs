#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use geo::vector::{DataFrame, DataFrameOptions};
    use path_macro::path;
    use sfr::{ConnectivityCheck, Error, Result, SetupConfig, io, records::TableKind};
    use tempfile::TempDir;

    fn data_dir() -> PathBuf {
        path!(env!("CARGO_MANIFEST_DIR") / "tests" / "data")
    }

    fn setup_file(dir: &Path, extra: &str) -> PathBuf {
        let data = data_dir();
        let contents = format!(
            "# SFR setup\n\
             reach_cutoff=1.0\n\
             flowlines='{}'\n\
             river_explode='{}'\n\
             river_cells_dissolve='{}'\n\
             output_dir='{}'\n\
             {extra}\n",
            path!(data / "flowlines.csv").display(),
            path!(data / "river_explode.csv").display(),
            path!(data / "river_cells_dissolve.csv").display(),
            path!(dir / "output").display(),
        );

        let path = path!(dir / "SFR_setup.in");
        std::fs::write(&path, contents).expect("Failed to write setup file");
        path
    }

    fn column(path: &Path, name: &str) -> Result<Vec<String>> {
        let df = DataFrame::read(path, &DataFrameOptions::default())?;
        let index = df.schema().field_index(name).expect("column present");
        Ok(df
            .rows()
            .iter()
            .map(|row| row.fields[index].as_ref().map(ToString::to_string).unwrap_or_default())
            .collect())
    }

    #[test_log::test]
    fn cleanup_tables() -> Result<()> {
        let tmp = TempDir::new()?;
        let setup = SetupConfig::from_file(&setup_file(tmp.path(), ""))?;
        let report = io::run(&setup)?;

        assert_eq!(report.segments_removed.no_elevation, 1);
        assert_eq!(report.segments_removed.thinned, 1);
        assert_eq!(report.reaches_removed_by_attributes.total(), 2);
        assert_eq!(report.reaches_removed_by_length, 3);
        assert_eq!(report.cells_removed, 5);
        assert_eq!(report.disconnected_reaches_removed, 0);
        assert_eq!(report.orphan_reaches_removed, 0);
        assert!(report.warnings.is_empty());

        assert_eq!(report.malformed.len(), 1);
        assert_eq!(report.malformed[0].table, TableKind::Reaches);
        assert_eq!(report.malformed[0].row, 7);

        let output = path!(tmp.path() / "output");
        assert_eq!(column(&path!(output / "flowlines.csv"), "COMID")?, ["13294", "13297"]);
        assert_eq!(column(&path!(output / "river_explode.csv"), "FID")?, ["0", "6"]);
        assert_eq!(column(&path!(output / "river_explode.csv"), "LengthFt")?, ["520.5", "640.25"]);
        assert_eq!(column(&path!(output / "river_cells_dissolve.csv"), "node")?, ["101", "105"]);

        // unknown columns are passed through
        assert_eq!(column(&path!(output / "flowlines.csv"), "GNIS_NAME")?, ["Turkey River", "Volga River"]);
        assert_eq!(column(&path!(output / "river_cells_dissolve.csv"), "column")?, ["40", "42"]);
        Ok(())
    }

    #[test_log::test]
    fn cleanup_of_cleaned_tables_removes_nothing() -> Result<()> {
        let tmp = TempDir::new()?;
        let first = SetupConfig::from_file(&setup_file(tmp.path(), ""))?;
        io::run(&first)?;

        let mut second = first.clone();
        second.segments = Some(path!(first.output_dir / "flowlines.csv"));
        second.reaches = path!(first.output_dir / "river_explode.csv");
        second.cells = path!(first.output_dir / "river_cells_dissolve.csv");
        second.output_dir = path!(tmp.path() / "output2");

        let report = io::run(&second)?;
        assert!(!report.has_removals());
        assert!(report.malformed.is_empty());

        for name in ["flowlines.csv", "river_explode.csv", "river_cells_dissolve.csv"] {
            assert_eq!(
                std::fs::read_to_string(path!(first.output_dir / name))?,
                std::fs::read_to_string(path!(second.output_dir / name))?
            );
        }

        Ok(())
    }

    #[test_log::test]
    fn reach_count_connectivity_check() -> Result<()> {
        let tmp = TempDir::new()?;
        let setup = SetupConfig::from_file(&setup_file(tmp.path(), "connectivity_check=reach_count"))?;
        assert_eq!(setup.cleanup.connectivity_check, ConnectivityCheck::ReachCount);

        let report = io::run(&setup)?;
        assert_eq!(report.cells_removed, 5);
        Ok(())
    }

    #[test_log::test]
    fn abort_on_malformed_records() -> Result<()> {
        let tmp = TempDir::new()?;
        let setup = SetupConfig::from_file(&setup_file(tmp.path(), "malformed_records=abort"))?;

        let err = io::run(&setup).expect_err("the length of reach 7 is not a number");
        assert!(matches!(
            err,
            Error::MalformedRecord {
                table: TableKind::Reaches,
                row: 7,
                ..
            }
        ));
        assert!(!setup.output_dir.exists());
        Ok(())
    }

    #[test_log::test]
    fn no_partial_output() -> Result<()> {
        let tmp = TempDir::new()?;
        let setup = SetupConfig::from_file(&setup_file(tmp.path(), ""))?;

        // a directory in the place of the temporary cell table makes the last write fail
        std::fs::create_dir_all(path!(setup.output_dir / ".tmp-river_cells_dissolve.csv"))?;

        assert!(io::run(&setup).is_err());
        for name in ["flowlines.csv", "river_explode.csv", "river_cells_dissolve.csv"] {
            assert!(!path!(setup.output_dir / name).exists(), "{name}");
        }
        assert!(!path!(setup.output_dir / ".tmp-flowlines.csv").exists());
        assert!(!path!(setup.output_dir / ".tmp-river_explode.csv").exists());
        Ok(())
    }

    #[test_log::test]
    fn failed_rename_removes_the_moved_tables() -> Result<()> {
        let tmp = TempDir::new()?;
        let setup = SetupConfig::from_file(&setup_file(tmp.path(), ""))?;

        // a non empty directory in the place of the reach table can't be replaced by the written table
        std::fs::create_dir_all(path!(setup.output_dir / "river_explode.csv" / "keep"))?;

        assert!(matches!(io::run(&setup), Err(Error::IOError(_))));
        assert!(!path!(setup.output_dir / "flowlines.csv").exists());
        assert!(!path!(setup.output_dir / "river_cells_dissolve.csv").exists());
        for name in ["flowlines.csv", "river_explode.csv", "river_cells_dissolve.csv"] {
            assert!(!path!(setup.output_dir / format!(".tmp-{name}")).exists(), "{name}");
        }
        Ok(())
    }

    #[test_log::test]
    fn missing_cell_column() -> Result<()> {
        let tmp = TempDir::new()?;
        let cells = path!(tmp.path() / "cells.csv");
        std::fs::write(&cells, "FID,cellnum\n0,101\n")?;

        let mut setup = SetupConfig::from_file(&setup_file(tmp.path(), ""))?;
        setup.cells = cells;

        assert!(matches!(io::run(&setup), Err(Error::Configuration(_))));
        assert!(!setup.output_dir.exists());
        Ok(())
    }

    #[test_log::test]
    fn reach_lengths_from_geometry() -> Result<()> {
        let tmp = TempDir::new()?;
        let reaches = path!(tmp.path() / "river_explode.csv");
        std::fs::write(
            &reaches,
            "node,COMID,MAXELEVSMO,WKT\n\
             101,13294,31020,\"LINESTRING (1000 2000, 1300 2400)\"\n\
             102,13294,31020,\"LINESTRING (1300 2400, 1300 2400.5)\"\n",
        )?;

        let mut setup = SetupConfig::from_file(&setup_file(tmp.path(), ""))?;
        setup.segments = None;
        setup.reaches = reaches;

        let report = io::run(&setup)?;
        assert_eq!(report.reaches_removed_by_length, 1);

        let output = path!(setup.output_dir / "river_explode.csv");
        assert_eq!(column(&output, "node")?, ["101"]);
        assert_eq!(column(&output, "X_start")?, ["1000.0"]);
        assert_eq!(column(&output, "Y_end")?, ["2400.0"]);
        assert_eq!(column(&output, "LengthFt")?, ["500.0"]);
        Ok(())
    }
}
