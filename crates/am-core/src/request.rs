//! Wire model exchanged with the Additive service.
//!
//! These mirror the service messages field for field. Transport encoding is
//! the concern of whatever implements the server connection.

use crate::machine::MachineMessage;
use crate::material::AdditiveMaterial;
use crate::material_tuning::MaterialTuningResult;
use crate::microstructure::MicrostructureResult;
use crate::porosity::PorosityResult;
use crate::single_bead::MeltPoolMessage;
use crate::thermal_history::{BuildFileMachineType, ThermalHistoryResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleBeadInputMessage {
    pub machine: MachineMessage,
    pub material: AdditiveMaterial,
    pub bead_length: f64,
    pub output_thermal_history: bool,
    pub thermal_history_interval: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PorosityInputMessage {
    pub machine: MachineMessage,
    pub material: AdditiveMaterial,
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureInputMessage {
    pub machine: MachineMessage,
    pub material: AdditiveMaterial,
    pub cube_min_x: f64,
    pub cube_min_y: f64,
    pub cube_min_z: f64,
    pub cube_size_x: f64,
    pub cube_size_y: f64,
    pub cube_size_z: f64,
    pub sensor_dimension: f64,
    pub use_provided_thermal_parameters: bool,
    pub cooling_rate: f64,
    pub thermal_gradient: f64,
    pub melt_pool_width: f64,
    pub melt_pool_depth: f64,
    pub use_random_seed: bool,
    pub random_seed: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeMessage {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoaxialAverageSensorInputsMessage {
    pub sensor_radius: f64,
    pub z_heights: Vec<RangeMessage>,
}

/// Part geometry previously uploaded to the server, by its remote name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryMessage {
    StlFile { name: String },
    BuildFile { machine_type: BuildFileMachineType, name: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalHistoryInputMessage {
    pub machine: MachineMessage,
    pub material: AdditiveMaterial,
    pub geometry: GeometryMessage,
    pub coax_ave_sensor_inputs: CoaxialAverageSensorInputsMessage,
}

/// File contents for a material tuning run. An empty characteristic width
/// lookup asks the service to compute one at the base plate temperature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialTuningInputMessage {
    pub experiment_data: Vec<u8>,
    pub material_parameters: Vec<u8>,
    pub thermal_properties_lookup: Vec<u8>,
    #[serde(default)]
    pub characteristic_width_lookup: Vec<u8>,
    pub allowable_error: f64,
    pub max_iterations: u32,
    pub base_plate_temperature: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestInput {
    SingleBead(SingleBeadInputMessage),
    Porosity(PorosityInputMessage),
    Microstructure(MicrostructureInputMessage),
    ThermalHistory(ThermalHistoryInputMessage),
    MaterialTuning(MaterialTuningInputMessage),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub id: String,
    pub input: RequestInput,
}

/// A named log file produced by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFile {
    pub name: String,
    pub content: String,
}

/// Concatenate log files, each preceded by its name.
pub fn concat_logs(files: &[LogFile]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str("File: ");
        out.push_str(&file.name);
        out.push('\n');
        out.push_str(&file.content);
        out.push('\n');
    }
    out
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationResult {
    MeltPool(MeltPoolMessage),
    Porosity(PorosityResult),
    Microstructure(MicrostructureResult),
    ThermalHistory(ThermalHistoryResult),
    MaterialTuning(MaterialTuningResult),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub id: String,
    pub result: SimulationResult,
    #[serde(default)]
    pub logs: Vec<LogFile>,
    /// Thermal history archive contents, present only when requested.
    #[serde(default)]
    pub thermal_history: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_are_prefixed_with_file_names() {
        let logs = vec![
            LogFile {
                name: "a.log".into(),
                content: "one".into(),
            },
            LogFile {
                name: "b.log".into(),
                content: "two".into(),
            },
        ];
        assert_eq!(concat_logs(&logs), "File: a.log\none\nFile: b.log\ntwo\n");
        assert_eq!(concat_logs(&[]), "");
    }
}
