//! CSV import and export of study tables.
//!
//! The first CSV column is a row index. It is written on export and ignored on
//! import.

use crate::columns::Column;
use crate::error::{StudyError, StudyResult};
use crate::row::{Cell, StudyRow};
use std::collections::BTreeSet;
use std::path::Path;

/// A row read from a file, keyed by column.
pub type RawRow = Vec<(Column, Cell)>;

/// Read a study CSV. The header after the index column must name exactly the
/// study columns, in any order.
pub fn read_study_csv(path: &Path) -> StudyResult<Vec<RawRow>> {
    if !path.exists() {
        return Err(StudyError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let columns: Option<Vec<Column>> = header
        .iter()
        .skip(1)
        .map(|name| Column::from_name(name))
        .collect();
    let columns = match columns {
        Some(c) => c,
        None => return Err(StudyError::MissingColumns(path.to_path_buf())),
    };
    let found: BTreeSet<Column> = columns.iter().copied().collect();
    let expected: BTreeSet<Column> = Column::ALL.iter().copied().collect();
    if found != expected || columns.len() != Column::ALL.len() {
        return Err(StudyError::MissingColumns(path.to_path_buf()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = columns
            .iter()
            .zip(record.iter().skip(1))
            .map(|(column, raw)| (*column, Cell::parse(*column, raw)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Write rows with a leading index column.
pub fn write_study_csv(path: &Path, rows: &[StudyRow]) -> StudyResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![String::new()];
    header.extend(Column::ALL.iter().map(|c| c.name().to_string()));
    writer.write_record(&header)?;

    for (index, row) in rows.iter().enumerate() {
        let mut record = vec![index.to_string()];
        record.extend(row.cells().iter().map(|c| c.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_core::{SimulationStatus, SimulationType};
    use std::path::PathBuf;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("am_study_csv_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn export_then_import_keeps_cells() {
        let path = temp_file("table.csv");
        let mut row = StudyRow::new(
            SimulationType::SingleBead,
            "sb_1",
            SimulationStatus::Pending,
            "IN718",
        );
        row.laser_power = 200.0;
        row.layer_thickness = 5e-5;
        write_study_csv(&path, &[row]).unwrap();

        let rows = read_study_csv(&path).unwrap();
        assert_eq!(rows.len(), 1);
        let cell = |col: Column| rows[0].iter().find(|(c, _)| *c == col).unwrap().1.clone();
        assert_eq!(cell(Column::Id), Cell::Text("sb_1".into()));
        assert_eq!(cell(Column::LaserPower), Cell::Number(200.0));
        assert_eq!(cell(Column::LayerThickness), Cell::Number(5e-5));
        assert_eq!(cell(Column::HatchSpacing), Cell::Empty);
    }

    #[test]
    fn missing_file_and_columns_are_rejected() {
        let missing = temp_file("nope.csv");
        let err = read_study_csv(&missing).unwrap_err();
        assert!(err.to_string().ends_with("does not exist."));

        let path = temp_file("short.csv");
        std::fs::write(&path, ",ID,Status\n0,a,Pending\n").unwrap();
        let err = read_study_csv(&path).unwrap_err();
        assert!(err.to_string().ends_with("does not have the expected columns."));
    }
}
