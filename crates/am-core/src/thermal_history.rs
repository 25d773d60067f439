//! Thermal history simulation of a part geometry, observed by coaxial
//! average sensors.

use crate::ids::new_sim_id;
use crate::machine::AdditiveMachine;
use crate::material::AdditiveMaterial;
use crate::numeric::validate_range;
use crate::request::{
    CoaxialAverageSensorInputsMessage, GeometryMessage, RangeMessage, RequestInput,
    SimulationRequest, ThermalHistoryInputMessage,
};
use crate::simulation::SimulationStatus;
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum radius (m) of the circular field of view of a sensor.
pub const MIN_SENSOR_RADIUS: f64 = 5e-5;
/// Maximum radius (m) of the circular field of view of a sensor.
pub const MAX_SENSOR_RADIUS: f64 = 1.5e-2;
/// Folder holding the coaxial average sensor results of a simulation.
pub const COAX_AVE_OUTPUT_DIR: &str = "coax_ave_output";
pub const COAX_AVE_OUTPUT_ZIP: &str = "coax_ave_output.zip";

/// Closed interval of z heights (m).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    min: f64,
    max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> CoreResult<Self> {
        if min > max {
            return Err(CoreError::validation(format!(
                "Range minimum {min} is greater than maximum {max}."
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Coaxial average sensors follow the scan path of every deposit layer
/// inside each of `z_heights`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoaxialAverageSensorInputs {
    radius: f64,
    pub z_heights: Vec<Range>,
}

impl Default for CoaxialAverageSensorInputs {
    fn default() -> Self {
        Self {
            radius: MIN_SENSOR_RADIUS,
            z_heights: Vec::new(),
        }
    }
}

impl CoaxialAverageSensorInputs {
    pub fn new(radius: f64, z_heights: Vec<Range>) -> CoreResult<Self> {
        let mut inputs = Self {
            z_heights,
            ..Self::default()
        };
        inputs.set_radius(radius)?;
        Ok(inputs)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, value: f64) -> CoreResult<()> {
        self.radius = validate_range(value, MIN_SENSOR_RADIUS, MAX_SENSOR_RADIUS, "radius")?;
        Ok(())
    }

    fn to_message(&self) -> CoaxialAverageSensorInputsMessage {
        CoaxialAverageSensorInputsMessage {
            sensor_radius: self.radius,
            z_heights: self
                .z_heights
                .iter()
                .map(|z| RangeMessage {
                    min: z.min,
                    max: z.max,
                })
                .collect(),
        }
    }
}

/// Machine a build file was written for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildFileMachineType {
    #[default]
    None,
    AdditiveIndustries,
    Slm,
    Renishaw,
    Eos,
    Trumpf,
    Hb3d,
    Sisma,
}

/// Part geometry on the local file system.
///
/// A build file is a zip archive holding the part STL, optional support
/// STLs (`*_vless.stl`, `*_solid.stl`) and the machine instruction files,
/// all at the root of the archive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeometryFile {
    Stl {
        path: PathBuf,
    },
    Build {
        machine_type: BuildFileMachineType,
        path: PathBuf,
    },
}

fn existing(path: &Path) -> CoreResult<PathBuf> {
    if !path.exists() {
        return Err(CoreError::validation(format!(
            "File does not exist, {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

impl GeometryFile {
    pub fn stl(path: impl AsRef<Path>) -> CoreResult<Self> {
        Ok(GeometryFile::Stl {
            path: existing(path.as_ref())?,
        })
    }

    pub fn build(machine_type: BuildFileMachineType, path: impl AsRef<Path>) -> CoreResult<Self> {
        Ok(GeometryFile::Build {
            machine_type,
            path: existing(path.as_ref())?,
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            GeometryFile::Stl { path } | GeometryFile::Build { path, .. } => path,
        }
    }

    fn to_message(&self, remote_name: &str) -> GeometryMessage {
        match self {
            GeometryFile::Stl { .. } => GeometryMessage::StlFile {
                name: remote_name.to_string(),
            },
            GeometryFile::Build { machine_type, .. } => GeometryMessage::BuildFile {
                machine_type: *machine_type,
                name: remote_name.to_string(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalHistoryInput {
    pub id: String,
    pub machine: AdditiveMachine,
    pub material: AdditiveMaterial,
    geometry: Option<GeometryFile>,
    pub coax_ave_sensor_inputs: CoaxialAverageSensorInputs,
}

impl Default for ThermalHistoryInput {
    fn default() -> Self {
        Self::new("", AdditiveMachine::default(), AdditiveMaterial::default())
    }
}

impl ThermalHistoryInput {
    pub fn new(id: impl Into<String>, machine: AdditiveMachine, material: AdditiveMaterial) -> Self {
        let id = id.into();
        Self {
            id: if id.is_empty() { new_sim_id() } else { id },
            machine,
            material,
            geometry: None,
            coax_ave_sensor_inputs: CoaxialAverageSensorInputs::default(),
        }
    }

    pub fn with_geometry(mut self, geometry: GeometryFile) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_sensor_inputs(mut self, inputs: CoaxialAverageSensorInputs) -> Self {
        self.coax_ave_sensor_inputs = inputs;
        self
    }

    pub fn geometry(&self) -> Option<&GeometryFile> {
        self.geometry.as_ref()
    }

    pub fn set_geometry(&mut self, geometry: GeometryFile) {
        self.geometry = Some(geometry);
    }

    /// Request for a geometry already uploaded under `remote_geometry_path`.
    pub fn to_request(&self, remote_geometry_path: &str) -> CoreResult<SimulationRequest> {
        let Some(geometry) = &self.geometry else {
            return Err(CoreError::validation(
                "Attempted to create simulation request without defining geometry",
            ));
        };
        if remote_geometry_path.is_empty() {
            return Err(CoreError::validation(
                "Attempted to create simulation request with empty remote_geometry_path",
            ));
        }
        Ok(SimulationRequest {
            id: self.id.clone(),
            input: RequestInput::ThermalHistory(ThermalHistoryInputMessage {
                machine: self.machine.to_message(),
                material: self.material.clone(),
                geometry: geometry.to_message(remote_geometry_path),
                coax_ave_sensor_inputs: self.coax_ave_sensor_inputs.to_message(),
            }),
        })
    }
}

/// Zipped VTK files, one per deposit layer, as returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalHistoryResult {
    pub coax_ave_zip: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalHistorySummary {
    pub input: ThermalHistoryInput,
    /// Folder holding the coaxial average sensor archive.
    pub coax_ave_output_folder: PathBuf,
    pub logs: String,
    pub status: SimulationStatus,
}

impl ThermalHistorySummary {
    pub fn new(
        input: ThermalHistoryInput,
        coax_ave_output_folder: PathBuf,
        logs: String,
        status: SimulationStatus,
    ) -> Self {
        Self {
            input,
            coax_ave_output_folder,
            logs,
            status,
        }
    }
}
