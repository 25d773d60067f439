//! Study file schema and migration.

use crate::columns::{Column, FORMAT_VERSION};
use crate::error::{StudyError, StudyResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// On-disk study. Rows are stored positionally against `columns` so renamed
/// columns can be migrated without touching the rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyFile {
    pub format_version: u32,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Version 1 wrote its version number incorrectly. This column only ever
/// appeared in version 1 files.
const V1_MARKER_COLUMN: &str = "Heater Temp (°C)";

const V1_RENAMES: &[(&str, Column)] = &[
    ("Heater Temp (°C)", Column::HeaterTemperature),
    ("Start Angle (°)", Column::StartAngle),
    ("Rotation Angle (°)", Column::RotationAngle),
    ("Cooling Rate (°K/s)", Column::CoolingRate),
    ("Thermal Gradient (°K/m)", Column::ThermalGradient),
    ("XY Average Grain Size (µm)", Column::XyAverageGrainSize),
    ("XZ Average Grain Size (µm)", Column::XzAverageGrainSize),
    ("YZ Average Grain Size (µm)", Column::YzAverageGrainSize),
    ("Melt Pool Length/Width (m)", Column::MeltPoolLengthOverWidth),
    (
        "Melt Pool Ref Depth/Width (m)",
        Column::MeltPoolReferenceDepthOverWidth,
    ),
];

/// Effective version of a loaded file.
pub fn detect_version(file: &StudyFile) -> u32 {
    if file.columns.iter().any(|c| c == V1_MARKER_COLUMN) {
        1
    } else {
        file.format_version
    }
}

pub fn migrate_to_latest(mut file: StudyFile) -> StudyResult<StudyFile> {
    let version = detect_version(&file);
    if version > FORMAT_VERSION {
        return Err(StudyError::UnsupportedVersion {
            version,
            latest: FORMAT_VERSION,
        });
    }
    if version == FORMAT_VERSION {
        return Ok(file);
    }

    info!("Updating parametric study to latest version.");
    file.format_version = version;
    while file.format_version < FORMAT_VERSION {
        file = migrate_one_version(file)?;
    }
    Ok(file)
}

fn migrate_one_version(file: StudyFile) -> StudyResult<StudyFile> {
    match file.format_version {
        0 | 1 => migrate_v1_to_v2(file),
        2 => migrate_v2_to_v3(file),
        v => Err(StudyError::UnsupportedVersion {
            version: v,
            latest: FORMAT_VERSION,
        }),
    }
}

fn migrate_v1_to_v2(mut file: StudyFile) -> StudyResult<StudyFile> {
    for column in &mut file.columns {
        if let Some((_, new)) = V1_RENAMES.iter().find(|(old, _)| *old == column.as_str()) {
            *column = new.name().to_string();
        }
    }
    file.format_version = 2;
    Ok(file)
}

// Version 3 only changed how the version number is written.
fn migrate_v2_to_v3(mut file: StudyFile) -> StudyResult<StudyFile> {
    file.format_version = 3;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(version: u32, columns: &[&str]) -> StudyFile {
        StudyFile {
            format_version: version,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: vec![],
        }
    }

    #[test]
    fn latest_is_noop() {
        let f = file(FORMAT_VERSION, &["ID", "Status"]);
        assert_eq!(migrate_to_latest(f.clone()).unwrap(), f);
    }

    #[test]
    fn version_one_columns_are_renamed() {
        // Version 1 files claim the latest version.
        let f = file(3, &["ID", "Heater Temp (°C)", "XY Average Grain Size (µm)"]);
        assert_eq!(detect_version(&f), 1);
        let migrated = migrate_to_latest(f).unwrap();
        assert_eq!(migrated.format_version, FORMAT_VERSION);
        assert_eq!(
            migrated.columns,
            vec!["ID", "Heater Temp (C)", "XY Average Grain Size (microns)"]
        );
    }

    #[test]
    fn future_versions_are_rejected() {
        let err = migrate_to_latest(file(4, &["ID"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported version, study version = 4, latest supported version is 3."
        );
    }
}
