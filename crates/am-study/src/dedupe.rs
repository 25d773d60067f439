//! Duplicate simulation removal.
//!
//! Two rows are duplicates when their input columns match. Which columns count
//! depends on the simulation type. Blank cells match each other.

use crate::columns::Column;
use crate::row::{Cell, STUDY_TYPES, StudyRow};
use am_core::{SimulationStatus, SimulationType};
use std::collections::HashSet;
use tracing::debug;

const COMMON_KEY: &[Column] = &[
    Column::Material,
    Column::HeaterTemperature,
    Column::LayerThickness,
    Column::BeamDiameter,
    Column::LaserPower,
    Column::ScanSpeed,
    Column::Type,
];

const SINGLE_BEAD_KEY: &[Column] = &[Column::SingleBeadLength];

const POROSITY_KEY: &[Column] = &[
    Column::StartAngle,
    Column::RotationAngle,
    Column::HatchSpacing,
    Column::StripeWidth,
    Column::PorositySizeX,
    Column::PorositySizeY,
    Column::PorositySizeZ,
];

const MICROSTRUCTURE_KEY: &[Column] = &[
    Column::StartAngle,
    Column::RotationAngle,
    Column::HatchSpacing,
    Column::StripeWidth,
    Column::MicroMinX,
    Column::MicroMinY,
    Column::MicroMinZ,
    Column::MicroSizeX,
    Column::MicroSizeY,
    Column::MicroSizeZ,
    Column::MicroSensorDim,
    Column::CoolingRate,
    Column::ThermalGradient,
    Column::MicroMeltPoolDepth,
    Column::MicroMeltPoolWidth,
    Column::RandomSeed,
];

/// Columns compared when looking for duplicates of a simulation type.
pub fn key_columns(sim_type: SimulationType) -> Vec<Column> {
    let extra = match sim_type {
        SimulationType::SingleBead => SINGLE_BEAD_KEY,
        SimulationType::Porosity => POROSITY_KEY,
        SimulationType::Microstructure => MICROSTRUCTURE_KEY,
        SimulationType::ThermalHistory => &[],
    };
    COMMON_KEY.iter().chain(extra).copied().collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum KeyPart {
    Empty,
    Number(u64),
    Text(String),
}

impl From<Cell> for KeyPart {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => KeyPart::Empty,
            // -0.0 and 0.0 compare equal
            Cell::Number(v) if v == 0.0 => KeyPart::Number(0),
            Cell::Number(v) => KeyPart::Number(v.to_bits()),
            Cell::Text(s) => KeyPart::Text(s),
        }
    }
}

fn row_key(row: &StudyRow, columns: &[Column]) -> Vec<KeyPart> {
    columns.iter().map(|c| KeyPart::from(row.get(*c))).collect()
}

/// Rank used to order rows before duplicates are dropped. Lower wins.
pub fn status_rank(status: SimulationStatus) -> u8 {
    match status {
        SimulationStatus::Completed => 0,
        SimulationStatus::Pending => 1,
        SimulationStatus::Skip => 2,
        SimulationStatus::Error => 3,
        _ => 4,
    }
}

/// Keep the first row for each key. With `keep_last`, keep the last one instead.
fn drop_duplicates(rows: Vec<StudyRow>, columns: &[Column], keep_last: bool) -> Vec<StudyRow> {
    let mut seen = HashSet::new();
    let mut kept: Vec<StudyRow> = Vec::with_capacity(rows.len());
    if keep_last {
        for row in rows.into_iter().rev() {
            if seen.insert(row_key(&row, columns)) {
                kept.push(row);
            }
        }
        kept.reverse();
    } else {
        for row in rows {
            if seen.insert(row_key(&row, columns)) {
                kept.push(row);
            }
        }
    }
    kept
}

/// Remove duplicate simulations and return how many were removed.
///
/// Rows are ordered Completed, Pending, Skip, Error, then everything else, so
/// a completed simulation always survives over a pending copy. With
/// `overwrite`, a newer row with the same status replaces the older one.
/// The surviving rows are grouped by simulation type.
pub fn remove_duplicates(rows: &mut Vec<StudyRow>, overwrite: bool) -> usize {
    let before = rows.len();
    if before == 0 {
        return 0;
    }

    let mut sorted = std::mem::take(rows);
    sorted.sort_by_key(|r| status_rank(r.status));

    for sim_type in STUDY_TYPES {
        let of_type: Vec<StudyRow> = sorted
            .iter()
            .filter(|r| r.sim_type == sim_type)
            .cloned()
            .collect();
        let key = key_columns(sim_type);
        let of_type = if overwrite {
            let mut with_status = key.clone();
            with_status.push(Column::Status);
            drop_duplicates(of_type, &with_status, true)
        } else {
            of_type
        };
        rows.extend(drop_duplicates(of_type, &key, false));
    }

    let removed = before - rows.len();
    if removed > 0 {
        debug!("Removed {removed} duplicate simulation(s).");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(sim_type: SimulationType, id: &str, status: SimulationStatus, power: f64) -> StudyRow {
        let mut row = StudyRow::new(sim_type, id, status, "IN718");
        row.laser_power = power;
        row.scan_speed = 1.0;
        row
    }

    fn ids(rows: &[StudyRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn completed_beats_pending() {
        let mut rows = vec![
            row(SimulationType::SingleBead, "a", SimulationStatus::Pending, 200.0),
            row(SimulationType::SingleBead, "b", SimulationStatus::Completed, 200.0),
        ];
        assert_eq!(remove_duplicates(&mut rows, false), 1);
        assert_eq!(ids(&rows), ["b"]);
    }

    #[test]
    fn overwrite_keeps_newest_completed() {
        let mut rows = vec![
            row(SimulationType::Porosity, "old", SimulationStatus::Completed, 200.0),
            row(SimulationType::Porosity, "new", SimulationStatus::Completed, 200.0),
        ];
        let mut plain = rows.clone();
        assert_eq!(remove_duplicates(&mut rows, true), 1);
        assert_eq!(ids(&rows), ["new"]);
        assert_eq!(remove_duplicates(&mut plain, false), 1);
        assert_eq!(ids(&plain), ["old"]);
    }

    #[test]
    fn different_types_are_not_duplicates() {
        let mut rows = vec![
            row(SimulationType::Microstructure, "m", SimulationStatus::Pending, 200.0),
            row(SimulationType::SingleBead, "s", SimulationStatus::Pending, 200.0),
            row(SimulationType::Porosity, "p", SimulationStatus::Pending, 200.0),
            row(SimulationType::SingleBead, "s2", SimulationStatus::Pending, 250.0),
        ];
        assert_eq!(remove_duplicates(&mut rows, false), 0);
        assert_eq!(ids(&rows), ["s", "s2", "p", "m"]);
    }

    #[test]
    fn blank_cells_match() {
        let a = row(SimulationType::Porosity, "a", SimulationStatus::Skip, 200.0);
        let b = row(SimulationType::Porosity, "b", SimulationStatus::Error, 200.0);
        assert!(a.hatch_spacing.is_nan());
        let mut rows = vec![b, a];
        assert_eq!(remove_duplicates(&mut rows, false), 1);
        assert_eq!(ids(&rows), ["a"]);
    }

    #[test]
    fn other_statuses_sort_last() {
        let mut rows = vec![
            row(SimulationType::SingleBead, "run", SimulationStatus::Running, 200.0),
            row(SimulationType::SingleBead, "err", SimulationStatus::Error, 200.0),
        ];
        assert_eq!(remove_duplicates(&mut rows, false), 1);
        assert_eq!(ids(&rows), ["err"]);
    }

    proptest! {
        #[test]
        fn second_pass_removes_nothing(
            powers in prop::collection::vec(prop::sample::select(vec![100.0, 150.0, 200.0]), 0..20),
            overwrite in any::<bool>(),
        ) {
            let mut rows: Vec<StudyRow> = powers
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let status = if i % 3 == 0 {
                        SimulationStatus::Completed
                    } else {
                        SimulationStatus::Pending
                    };
                    row(SimulationType::SingleBead, &format!("sb_{i}"), status, *p)
                })
                .collect();
            let removed = remove_duplicates(&mut rows, overwrite);
            prop_assert_eq!(removed + rows.len(), powers.len());
            prop_assert_eq!(remove_duplicates(&mut rows, overwrite), 0);
        }
    }
}
