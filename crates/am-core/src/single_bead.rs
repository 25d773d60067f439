//! Single bead simulation input and melt pool results.

use crate::ids::new_sim_id;
use crate::machine::AdditiveMachine;
use crate::material::AdditiveMaterial;
use crate::numeric::{median, validate_range};
use crate::request::{RequestInput, SimulationRequest, SingleBeadInputMessage};
use crate::simulation::SimulationStatus;
use crate::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BEAD_LENGTH: f64 = 3e-3;
pub const MIN_BEAD_LENGTH: f64 = 1e-3;
pub const MAX_BEAD_LENGTH: f64 = 1e-2;
pub const DEFAULT_THERMAL_HISTORY_INTERVAL: u32 = 1;
pub const MIN_THERMAL_HISTORY_INTERVAL: u32 = 1;
pub const MAX_THERMAL_HISTORY_INTERVAL: u32 = 10_000;

/// Name of the archive holding thermal history output for a single bead run.
pub const THERMAL_HISTORY_OUTPUT_ZIP: &str = "gridfullthermal.zip";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleBeadInput {
    pub id: String,
    pub machine: AdditiveMachine,
    pub material: AdditiveMaterial,
    bead_length: f64,
    output_thermal_history: bool,
    thermal_history_interval: u32,
}

impl Default for SingleBeadInput {
    fn default() -> Self {
        Self::new("", AdditiveMachine::default(), AdditiveMaterial::default())
    }
}

impl SingleBeadInput {
    /// New input with default bead settings. An empty id is replaced by a random one.
    pub fn new(id: impl Into<String>, machine: AdditiveMachine, material: AdditiveMaterial) -> Self {
        let id = id.into();
        Self {
            id: if id.is_empty() { new_sim_id() } else { id },
            machine,
            material,
            bead_length: DEFAULT_BEAD_LENGTH,
            output_thermal_history: false,
            thermal_history_interval: DEFAULT_THERMAL_HISTORY_INTERVAL,
        }
    }

    pub fn with_bead_length(mut self, value: f64) -> CoreResult<Self> {
        self.set_bead_length(value)?;
        Ok(self)
    }

    /// Length (m) of bead to simulate.
    pub fn bead_length(&self) -> f64 {
        self.bead_length
    }

    pub fn set_bead_length(&mut self, value: f64) -> CoreResult<()> {
        self.bead_length = validate_range(value, MIN_BEAD_LENGTH, MAX_BEAD_LENGTH, "bead_length")?;
        Ok(())
    }

    pub fn output_thermal_history(&self) -> bool {
        self.output_thermal_history
    }

    pub fn set_output_thermal_history(&mut self, value: bool) {
        self.output_thermal_history = value;
    }

    /// Simulation steps between thermal history outputs. 1 means every step.
    pub fn thermal_history_interval(&self) -> u32 {
        self.thermal_history_interval
    }

    pub fn set_thermal_history_interval(&mut self, value: u32) -> CoreResult<()> {
        validate_range(
            f64::from(value),
            f64::from(MIN_THERMAL_HISTORY_INTERVAL),
            f64::from(MAX_THERMAL_HISTORY_INTERVAL),
            "thermal_history_interval",
        )?;
        self.thermal_history_interval = value;
        Ok(())
    }

    pub fn to_request(&self) -> SimulationRequest {
        SimulationRequest {
            id: self.id.clone(),
            input: RequestInput::SingleBead(SingleBeadInputMessage {
                machine: self.machine.to_message(),
                material: self.material.clone(),
                bead_length: self.bead_length,
                output_thermal_history: self.output_thermal_history,
                thermal_history_interval: self.thermal_history_interval,
            }),
        }
    }
}

/// Melt pool dimensions (m) at one time step, keyed by laser position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeltPoolTimeStep {
    pub laser_x: f64,
    pub laser_y: f64,
    pub length: f64,
    pub width: f64,
    pub depth: f64,
    pub reference_width: f64,
    pub reference_depth: f64,
}

/// Melt pool results as returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeltPoolMessage {
    pub time_steps: Vec<MeltPoolTimeStep>,
    /// Server side name of the thermal history archive, empty when none was produced.
    #[serde(default)]
    pub thermal_history_vtk_zip: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeltPool {
    time_steps: Vec<MeltPoolTimeStep>,
    thermal_history_output: Option<PathBuf>,
}

impl MeltPool {
    pub fn new(msg: &MeltPoolMessage, thermal_history_output: Option<PathBuf>) -> Self {
        Self {
            time_steps: msg.time_steps.clone(),
            thermal_history_output,
        }
    }

    pub fn time_steps(&self) -> &[MeltPoolTimeStep] {
        &self.time_steps
    }

    /// Directory holding thermal history output, when requested.
    pub fn thermal_history_output(&self) -> Option<&PathBuf> {
        self.thermal_history_output.as_ref()
    }

    fn column_median(&self, f: impl Fn(&MeltPoolTimeStep) -> f64) -> f64 {
        let values: Vec<f64> = self.time_steps.iter().map(f).collect();
        median(&values)
    }

    pub fn median_width(&self) -> f64 {
        self.column_median(|ts| ts.width)
    }

    pub fn median_depth(&self) -> f64 {
        self.column_median(|ts| ts.depth)
    }

    pub fn median_length(&self) -> f64 {
        self.column_median(|ts| ts.length)
    }

    pub fn median_reference_width(&self) -> f64 {
        self.column_median(|ts| ts.reference_width)
    }

    pub fn median_reference_depth(&self) -> f64 {
        self.column_median(|ts| ts.reference_depth)
    }

    /// Median reference depth over median reference width.
    pub fn depth_over_width(&self) -> f64 {
        let width = self.median_reference_width();
        if width != 0.0 {
            self.median_reference_depth() / width
        } else {
            f64::NAN
        }
    }

    /// Median length over median width.
    pub fn length_over_width(&self) -> f64 {
        let width = self.median_width();
        if width != 0.0 {
            self.median_length() / width
        } else {
            f64::NAN
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleBeadSummary {
    pub input: SingleBeadInput,
    pub melt_pool: MeltPool,
    pub logs: String,
    pub status: SimulationStatus,
}

impl SingleBeadSummary {
    pub fn new(
        input: SingleBeadInput,
        msg: &MeltPoolMessage,
        logs: String,
        thermal_history_output: Option<PathBuf>,
        status: SimulationStatus,
    ) -> Self {
        Self {
            input,
            melt_pool: MeltPool::new(msg, thermal_history_output),
            logs,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(length: f64, width: f64, depth: f64, rw: f64, rd: f64) -> MeltPoolTimeStep {
        MeltPoolTimeStep {
            laser_x: 0.0,
            laser_y: 0.0,
            length,
            width,
            depth,
            reference_width: rw,
            reference_depth: rd,
        }
    }

    #[test]
    fn empty_id_gets_generated() {
        let input = SingleBeadInput::default();
        assert_eq!(input.id.len(), 12);
        let named = SingleBeadInput::new("sb_1", AdditiveMachine::default(), AdditiveMaterial::default());
        assert_eq!(named.id, "sb_1");
    }

    #[test]
    fn bead_length_range() {
        let err = SingleBeadInput::default().with_bead_length(0.5).unwrap_err();
        assert_eq!(err.to_string(), "bead_length must be between 0.001 and 0.01.");
    }

    #[test]
    fn thermal_history_interval_range() {
        let mut input = SingleBeadInput::default();
        input.set_thermal_history_interval(10_000).unwrap();
        assert!(input.set_thermal_history_interval(0).is_err());
    }

    #[test]
    fn melt_pool_ratios() {
        let msg = MeltPoolMessage {
            time_steps: vec![
                step(4.0, 2.0, 1.0, 2.0, 1.0),
                step(6.0, 2.0, 1.0, 4.0, 3.0),
                step(8.0, 2.0, 1.0, 6.0, 3.0),
            ],
            thermal_history_vtk_zip: String::new(),
        };
        let pool = MeltPool::new(&msg, None);
        assert_eq!(pool.median_length(), 6.0);
        assert_eq!(pool.length_over_width(), 3.0);
        assert_eq!(pool.depth_over_width(), 3.0 / 4.0);
    }

    #[test]
    fn zero_width_gives_nan_ratio() {
        let msg = MeltPoolMessage {
            time_steps: vec![step(1.0, 0.0, 1.0, 0.0, 1.0)],
            thermal_history_vtk_zip: String::new(),
        };
        let pool = MeltPool::new(&msg, None);
        assert!(pool.length_over_width().is_nan());
        assert!(pool.depth_over_width().is_nan());
    }
}
