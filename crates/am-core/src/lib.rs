//! am-core: domain foundation for the additive client.
//!
//! Contains:
//! - units (uom SI types, constructors, Celsius/kelvin and degree/radian conversions)
//! - numeric (Real, tolerances, range validation, median)
//! - ids (short random simulation ids)
//! - machine, material (validated machine settings and material definitions)
//! - single_bead, porosity, microstructure, thermal_history (simulation inputs and summaries)
//! - material_tuning (tuning a user defined material against experiments)
//! - simulation (types, status, input/summary/outcome enums)
//! - request (wire model exchanged with the service)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod machine;
pub mod material;
pub mod material_tuning;
pub mod microstructure;
pub mod numeric;
pub mod porosity;
pub mod request;
pub mod simulation;
pub mod single_bead;
pub mod thermal_history;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use machine::{AdditiveMachine, HeatSourceModel, MachineMessage, MachineParams};
pub use material::{
    AdditiveMaterial, CharacteristicWidthDataPoint, RESERVED_MATERIAL_NAMES,
    ThermalPropertiesDataPoint,
};
pub use material_tuning::{MaterialTuningInput, MaterialTuningResult, MaterialTuningSummary};
pub use microstructure::{
    CircleEquivalence, MicrostructureInput, MicrostructureParams, MicrostructureResult,
    MicrostructureSummary,
};
pub use numeric::*;
pub use porosity::{PorosityInput, PorosityResult, PorositySummary};
pub use request::{LogFile, SimulationRequest, SimulationResponse, SimulationResult};
pub use simulation::{
    SimulationError, SimulationInput, SimulationOutcome, SimulationStatus, SimulationSummary,
    SimulationType,
};
pub use single_bead::{MeltPool, MeltPoolMessage, MeltPoolTimeStep, SingleBeadInput, SingleBeadSummary};
pub use thermal_history::{
    BuildFileMachineType, CoaxialAverageSensorInputs, GeometryFile, Range, ThermalHistoryInput,
    ThermalHistoryResult, ThermalHistorySummary,
};
pub use units::*;
