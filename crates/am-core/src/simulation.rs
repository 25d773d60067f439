//! Common simulation definitions shared by the client and the study.

use crate::machine::AdditiveMachine;
use crate::material::AdditiveMaterial;
use crate::microstructure::{MicrostructureInput, MicrostructureSummary};
use crate::porosity::{PorosityInput, PorositySummary};
use crate::request::SimulationRequest;
use crate::single_bead::{SingleBeadInput, SingleBeadSummary};
use crate::thermal_history::{ThermalHistoryInput, ThermalHistorySummary};
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SimulationType {
    SingleBead,
    Porosity,
    Microstructure,
    ThermalHistory,
}

impl SimulationType {
    pub const ALL: [SimulationType; 4] = [
        SimulationType::SingleBead,
        SimulationType::Porosity,
        SimulationType::Microstructure,
        SimulationType::ThermalHistory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimulationType::SingleBead => "SingleBead",
            SimulationType::Porosity => "Porosity",
            SimulationType::Microstructure => "Microstructure",
            SimulationType::ThermalHistory => "ThermalHistory",
        }
    }
}

impl fmt::Display for SimulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimulationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::validation(format!("Invalid simulation type: {s}.")))
    }
}

/// Simulation status. Declaration order is the precedence used when
/// choosing between duplicate simulations: earlier wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SimulationStatus {
    Completed,
    Warning,
    Error,
    Cancelled,
    Running,
    Pending,
    New,
    /// Do not run. Only meaningful inside a parametric study.
    Skip,
}

impl SimulationStatus {
    pub const ALL: [SimulationStatus; 8] = [
        SimulationStatus::Completed,
        SimulationStatus::Warning,
        SimulationStatus::Error,
        SimulationStatus::Cancelled,
        SimulationStatus::Running,
        SimulationStatus::Pending,
        SimulationStatus::New,
        SimulationStatus::Skip,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimulationStatus::Completed => "Completed",
            SimulationStatus::Warning => "Warning",
            SimulationStatus::Error => "Error",
            SimulationStatus::Cancelled => "Cancelled",
            SimulationStatus::Running => "Running",
            SimulationStatus::Pending => "Pending",
            SimulationStatus::New => "New",
            SimulationStatus::Skip => "Skip",
        }
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimulationStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| CoreError::validation(format!("Invalid simulation status {s}")))
    }
}

/// Any input the client can submit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimulationInput {
    SingleBead(SingleBeadInput),
    Porosity(PorosityInput),
    Microstructure(MicrostructureInput),
    ThermalHistory(ThermalHistoryInput),
}

impl SimulationInput {
    pub fn id(&self) -> &str {
        match self {
            SimulationInput::SingleBead(i) => &i.id,
            SimulationInput::Porosity(i) => &i.id,
            SimulationInput::Microstructure(i) => &i.id,
            SimulationInput::ThermalHistory(i) => &i.id,
        }
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        match self {
            SimulationInput::SingleBead(i) => i.id = id,
            SimulationInput::Porosity(i) => i.id = id,
            SimulationInput::Microstructure(i) => i.id = id,
            SimulationInput::ThermalHistory(i) => i.id = id,
        }
    }

    pub fn machine(&self) -> &AdditiveMachine {
        match self {
            SimulationInput::SingleBead(i) => &i.machine,
            SimulationInput::Porosity(i) => &i.machine,
            SimulationInput::Microstructure(i) => &i.machine,
            SimulationInput::ThermalHistory(i) => &i.machine,
        }
    }

    pub fn material(&self) -> &AdditiveMaterial {
        match self {
            SimulationInput::SingleBead(i) => &i.material,
            SimulationInput::Porosity(i) => &i.material,
            SimulationInput::Microstructure(i) => &i.material,
            SimulationInput::ThermalHistory(i) => &i.material,
        }
    }

    pub fn sim_type(&self) -> SimulationType {
        match self {
            SimulationInput::SingleBead(_) => SimulationType::SingleBead,
            SimulationInput::Porosity(_) => SimulationType::Porosity,
            SimulationInput::Microstructure(_) => SimulationType::Microstructure,
            SimulationInput::ThermalHistory(_) => SimulationType::ThermalHistory,
        }
    }

    /// Thermal history requests name an uploaded geometry and are built with
    /// [`ThermalHistoryInput::to_request`] instead, so they fail here.
    pub fn to_request(&self) -> CoreResult<SimulationRequest> {
        match self {
            SimulationInput::SingleBead(i) => Ok(i.to_request()),
            SimulationInput::Porosity(i) => Ok(i.to_request()),
            SimulationInput::Microstructure(i) => Ok(i.to_request()),
            SimulationInput::ThermalHistory(i) => i.to_request(""),
        }
    }
}

impl From<SingleBeadInput> for SimulationInput {
    fn from(input: SingleBeadInput) -> Self {
        SimulationInput::SingleBead(input)
    }
}

impl From<PorosityInput> for SimulationInput {
    fn from(input: PorosityInput) -> Self {
        SimulationInput::Porosity(input)
    }
}

impl From<MicrostructureInput> for SimulationInput {
    fn from(input: MicrostructureInput) -> Self {
        SimulationInput::Microstructure(input)
    }
}

impl From<ThermalHistoryInput> for SimulationInput {
    fn from(input: ThermalHistoryInput) -> Self {
        SimulationInput::ThermalHistory(input)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimulationSummary {
    SingleBead(SingleBeadSummary),
    Porosity(PorositySummary),
    Microstructure(MicrostructureSummary),
    ThermalHistory(ThermalHistorySummary),
}

impl SimulationSummary {
    pub fn id(&self) -> &str {
        match self {
            SimulationSummary::SingleBead(s) => &s.input.id,
            SimulationSummary::Porosity(s) => &s.input.id,
            SimulationSummary::Microstructure(s) => &s.input.id,
            SimulationSummary::ThermalHistory(s) => &s.input.id,
        }
    }

    pub fn sim_type(&self) -> SimulationType {
        match self {
            SimulationSummary::SingleBead(_) => SimulationType::SingleBead,
            SimulationSummary::Porosity(_) => SimulationType::Porosity,
            SimulationSummary::Microstructure(_) => SimulationType::Microstructure,
            SimulationSummary::ThermalHistory(_) => SimulationType::ThermalHistory,
        }
    }

    pub fn status(&self) -> SimulationStatus {
        match self {
            SimulationSummary::SingleBead(s) => s.status,
            SimulationSummary::Porosity(s) => s.status,
            SimulationSummary::Microstructure(s) => s.status,
            SimulationSummary::ThermalHistory(s) => s.status,
        }
    }

    pub fn logs(&self) -> &str {
        match self {
            SimulationSummary::SingleBead(s) => &s.logs,
            SimulationSummary::Porosity(s) => &s.logs,
            SimulationSummary::Microstructure(s) => &s.logs,
            SimulationSummary::ThermalHistory(s) => &s.logs,
        }
    }

    /// Input the summary was produced from.
    pub fn input(&self) -> SimulationInput {
        match self {
            SimulationSummary::SingleBead(s) => s.input.clone().into(),
            SimulationSummary::Porosity(s) => s.input.clone().into(),
            SimulationSummary::Microstructure(s) => s.input.clone().into(),
            SimulationSummary::ThermalHistory(s) => s.input.clone().into(),
        }
    }
}

/// A simulation that failed on the service or could not be submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationError {
    pub input: SimulationInput,
    pub message: String,
    pub logs: String,
}

impl SimulationError {
    pub fn new(input: SimulationInput, message: impl Into<String>, logs: impl Into<String>) -> Self {
        Self {
            input,
            message: message.into(),
            logs: logs.into(),
        }
    }
}

/// Result of running one simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimulationOutcome {
    Summary(SimulationSummary),
    Error(SimulationError),
}

impl SimulationOutcome {
    pub fn id(&self) -> &str {
        match self {
            SimulationOutcome::Summary(s) => s.id(),
            SimulationOutcome::Error(e) => e.input.id(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SimulationOutcome::Error(_))
    }
}
