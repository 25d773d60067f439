//! A single simulation running on a server.

use crate::connection::{Operation, OperationResult, ServerConnection, StatusCode};
use crate::error::{ClientError, ClientResult};
use crate::progress::{Progress, ProgressHandler, ProgressState};
use am_core::request::concat_logs;
use am_core::{
    MicrostructureSummary, PorositySummary, SimulationError, SimulationInput, SimulationOutcome,
    SimulationResponse, SimulationResult, SimulationStatus, SimulationSummary, SingleBeadSummary,
    ThermalHistorySummary,
};
use am_results::OutputStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default time a single wait call blocks before reporting progress.
pub const DEFAULT_PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_secs(5);

pub struct SimulationTask {
    server: Arc<dyn ServerConnection>,
    operation: Operation,
    input: SimulationInput,
    store: OutputStore,
    summary: Option<SimulationOutcome>,
}

impl SimulationTask {
    pub fn new(
        server: Arc<dyn ServerConnection>,
        operation: Operation,
        input: SimulationInput,
        store: OutputStore,
    ) -> Self {
        Self {
            server,
            operation,
            input,
            store,
            summary: None,
        }
    }

    pub fn simulation_id(&self) -> &str {
        self.input.id()
    }

    pub fn operation_name(&self) -> &str {
        &self.operation.name
    }

    pub fn input(&self) -> &SimulationInput {
        &self.input
    }

    /// Summary or error of the finished simulation, `None` while it runs.
    pub fn summary(&self) -> Option<&SimulationOutcome> {
        self.summary.as_ref()
    }

    pub fn done(&self) -> bool {
        self.operation.done
    }

    /// The operation was cancelled before it produced a result.
    pub fn cancelled(&self) -> bool {
        matches!(
            &self.operation.result,
            Some(OperationResult::Error(err)) if err.code == StatusCode::Cancelled
        )
    }

    /// Fetch the operation from the server and update progress and results.
    pub fn status(&mut self) -> ClientResult<Progress> {
        let op = self.server.get_operation(&self.operation.name)?;
        Ok(self.update_operation_status(op))
    }

    /// Block until the simulation is done, reporting progress every `interval`.
    pub fn wait(
        &mut self,
        interval: Duration,
        mut handler: Option<&mut dyn ProgressHandler>,
    ) -> ClientResult<Progress> {
        debug!("Waiting for {} to complete", self.operation.name);
        loop {
            match self.server.wait_operation(&self.operation.name, interval) {
                Ok(op) => {
                    let done = op.done;
                    let progress = self.update_operation_status(op);
                    if let Some(h) = handler.as_deref_mut() {
                        h.update(&progress);
                    }
                    if done {
                        break;
                    }
                }
                Err(e) => {
                    error!("Error while awaiting operation: {e}");
                    break;
                }
            }
        }

        // Final poll so the last messages and the summary are picked up.
        let progress = self.status()?;
        if let Some(h) = handler.as_deref_mut() {
            h.update(&progress);
        }
        Ok(progress)
    }

    /// Record `message` as the outcome of a task that ended without one.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.summary.is_some() {
            return;
        }
        let error = SimulationError::new(self.input.clone(), message, "");
        if let Err(e) = self.store.save_error(&error) {
            warn!("Failed to save error for {}: {e}", error.input.id());
        }
        self.summary = Some(SimulationOutcome::Error(error));
    }

    pub fn cancel(&self) -> ClientResult<()> {
        debug!("Cancelling {}", self.operation.name);
        self.server.cancel_operation(&self.operation.name)
    }

    fn update_operation_status(&mut self, op: Operation) -> Progress {
        self.operation = op;
        let mut progress = Progress::from_metadata(&self.operation.metadata);
        if !self.operation.done {
            return progress;
        }

        match self.operation.result.clone() {
            Some(OperationResult::Response(response)) => {
                let outcome = match self.create_summary(response, progress.state) {
                    Ok(summary) => {
                        if let Err(e) = self.store.save_summary(&summary) {
                            warn!("Failed to save outputs for {}: {e}", summary.id());
                        }
                        SimulationOutcome::Summary(summary)
                    }
                    Err(e) => {
                        progress.state = ProgressState::Error;
                        SimulationOutcome::Error(SimulationError::new(
                            self.input.clone(),
                            e.to_string(),
                            "",
                        ))
                    }
                };
                self.summary = Some(outcome);
            }
            Some(OperationResult::Error(err))
                if !matches!(err.code, StatusCode::Ok | StatusCode::Cancelled) =>
            {
                let error =
                    SimulationError::new(self.input.clone(), err.message, concat_logs(&err.logs));
                if let Err(e) = self.store.save_error(&error) {
                    warn!("Failed to save error for {}: {e}", error.input.id());
                }
                self.summary = Some(SimulationOutcome::Error(error));
                progress.state = ProgressState::Error;
            }
            Some(OperationResult::Error(_)) => {}
            None => {
                warn!("Operation {} finished without a result", self.operation.name);
                self.fail(format!(
                    "Simulation {} finished without a result",
                    self.input.id()
                ));
                progress.state = ProgressState::Error;
            }
        }
        progress
    }

    fn create_summary(
        &self,
        response: SimulationResponse,
        state: ProgressState,
    ) -> ClientResult<SimulationSummary> {
        let status = match state {
            ProgressState::Error => SimulationStatus::Error,
            ProgressState::Warning => SimulationStatus::Warning,
            _ => SimulationStatus::Completed,
        };
        let logs = concat_logs(&response.logs);
        let id = self.input.id().to_string();

        match (&self.input, &response.result) {
            (SimulationInput::SingleBead(input), SimulationResult::MeltPool(msg)) => {
                let thermal_dir = match &response.thermal_history {
                    Some(bytes) => Some(self.store.write_thermal_history(&id, bytes)?),
                    None => None,
                };
                Ok(SimulationSummary::SingleBead(SingleBeadSummary::new(
                    input.clone(),
                    msg,
                    logs,
                    thermal_dir,
                    status,
                )))
            }
            (SimulationInput::Porosity(input), SimulationResult::Porosity(result)) => Ok(
                SimulationSummary::Porosity(PorositySummary::new(input.clone(), result, logs, status)),
            ),
            (SimulationInput::Microstructure(input), SimulationResult::Microstructure(result)) => {
                let dir = self.store.write_microstructure_vtk(&id, result)?;
                Ok(SimulationSummary::Microstructure(MicrostructureSummary::new(
                    input.clone(),
                    result,
                    logs,
                    &dir,
                    status,
                )))
            }
            (SimulationInput::ThermalHistory(input), SimulationResult::ThermalHistory(result)) => {
                let dir = self.store.write_coax_ave_output(&id, &result.coax_ave_zip)?;
                Ok(SimulationSummary::ThermalHistory(ThermalHistorySummary::new(
                    input.clone(),
                    dir,
                    logs,
                    status,
                )))
            }
            _ => Err(ClientError::Server(format!(
                "Unexpected result type for {} simulation {id}",
                self.input.sim_type()
            ))),
        }
    }
}
