use crate::ids::new_sim_id;
use crate::machine::AdditiveMachine;
use crate::material::AdditiveMaterial;
use crate::numeric::validate_range;
use crate::request::{PorosityInputMessage, RequestInput, SimulationRequest};
use crate::simulation::SimulationStatus;
use crate::CoreResult;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_SIZE: f64 = 3e-3;
pub const MIN_SAMPLE_SIZE: f64 = 1e-3;
pub const MAX_SAMPLE_SIZE: f64 = 1e-2;

/// Porosity simulation of a cuboid sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PorosityInput {
    pub id: String,
    pub machine: AdditiveMachine,
    pub material: AdditiveMaterial,
    size_x: f64,
    size_y: f64,
    size_z: f64,
}

impl Default for PorosityInput {
    fn default() -> Self {
        Self::new("", AdditiveMachine::default(), AdditiveMaterial::default())
    }
}

impl PorosityInput {
    pub fn new(id: impl Into<String>, machine: AdditiveMachine, material: AdditiveMaterial) -> Self {
        let id = id.into();
        Self {
            id: if id.is_empty() { new_sim_id() } else { id },
            machine,
            material,
            size_x: DEFAULT_SAMPLE_SIZE,
            size_y: DEFAULT_SAMPLE_SIZE,
            size_z: DEFAULT_SAMPLE_SIZE,
        }
    }

    pub fn with_size(mut self, x: f64, y: f64, z: f64) -> CoreResult<Self> {
        self.set_size_x(x)?;
        self.set_size_y(y)?;
        self.set_size_z(z)?;
        Ok(self)
    }

    pub fn size_x(&self) -> f64 {
        self.size_x
    }

    pub fn set_size_x(&mut self, value: f64) -> CoreResult<()> {
        self.size_x = validate_range(value, MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, "size_x")?;
        Ok(())
    }

    pub fn size_y(&self) -> f64 {
        self.size_y
    }

    pub fn set_size_y(&mut self, value: f64) -> CoreResult<()> {
        self.size_y = validate_range(value, MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, "size_y")?;
        Ok(())
    }

    pub fn size_z(&self) -> f64 {
        self.size_z
    }

    pub fn set_size_z(&mut self, value: f64) -> CoreResult<()> {
        self.size_z = validate_range(value, MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, "size_z")?;
        Ok(())
    }

    pub fn to_request(&self) -> SimulationRequest {
        SimulationRequest {
            id: self.id.clone(),
            input: RequestInput::Porosity(PorosityInputMessage {
                machine: self.machine.to_message(),
                material: self.material.clone(),
                size_x: self.size_x,
                size_y: self.size_y,
                size_z: self.size_z,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PorosityResult {
    pub void_ratio: f64,
    pub powder_ratio: f64,
    pub solid_ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PorositySummary {
    pub input: PorosityInput,
    /// Fraction of the sample that is solid material.
    pub relative_density: f64,
    pub logs: String,
    pub status: SimulationStatus,
}

impl PorositySummary {
    pub fn new(
        input: PorosityInput,
        result: &PorosityResult,
        logs: String,
        status: SimulationStatus,
    ) -> Self {
        Self {
            input,
            relative_density: result.solid_ratio,
            logs,
            status,
        }
    }
}
