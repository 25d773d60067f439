//! Progress handler that writes simulation status into a study as it changes.

use crate::study::ParametricStudy;
use am_client::{
    OperationResult, Progress, ProgressHandler, ProgressState, ServerConnection, find_operation,
};
use am_core::microstructure::average_grain_size;
use am_core::{MeltPool, SimulationResult, SimulationStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Writes progress into a study shared behind a mutex.
///
/// Pass it to [`ParametricRunner::simulate`](crate::ParametricRunner::simulate)
/// or use [`ParametricStudy::run_shared_simulations`], which builds one.
/// `ParametricStudy::run_simulations` borrows the study mutably, so this
/// handler cannot be used with it.
pub struct ParametricStudyProgressHandler {
    study: Arc<Mutex<ParametricStudy>>,
    servers: Vec<Arc<dyn ServerConnection>>,
    last_states: HashMap<String, ProgressState>,
}

impl ParametricStudyProgressHandler {
    pub fn new(study: Arc<Mutex<ParametricStudy>>, servers: Vec<Arc<dyn ServerConnection>>) -> Self {
        Self {
            study,
            servers,
            last_states: HashMap::new(),
        }
    }

    fn study(&self) -> MutexGuard<'_, ParametricStudy> {
        self.study.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_status(&self, sim_id: &str, status: SimulationStatus, message: Option<&str>) {
        if let Err(e) = self.study().set_simulation_status(sim_id, status, message) {
            warn!("Failed to update status of {sim_id}: {e}");
        }
    }

    /// Copy the results of a finished operation into the study.
    fn update_results(&self, sim_id: &str) {
        let op = match find_operation(&self.servers, sim_id) {
            Ok(op) => op,
            Err(e) => {
                warn!("Failed to find results for {sim_id}: {e}");
                return;
            }
        };
        let Some(OperationResult::Response(response)) = op.result else {
            warn!("Failed to find results for {sim_id}");
            return;
        };

        let mut study = self.study();
        let updated = match &response.result {
            SimulationResult::MeltPool(msg) => {
                study.update_single_bead_results(sim_id, &MeltPool::new(msg, None))
            }
            SimulationResult::Porosity(result) => {
                study.update_porosity_results(sim_id, result.solid_ratio)
            }
            SimulationResult::Microstructure(result) => study.update_microstructure_results(
                sim_id,
                average_grain_size(&result.xy_circle_equivalence),
                average_grain_size(&result.xz_circle_equivalence),
                average_grain_size(&result.yz_circle_equivalence),
            ),
            SimulationResult::ThermalHistory(_) | SimulationResult::MaterialTuning(_) => {
                warn!("A study has no columns for the results of {sim_id}");
                return;
            }
        };
        match updated {
            Ok(()) => info!("Updated results for {sim_id}"),
            Err(e) => warn!("Failed to save results for {sim_id}: {e}"),
        }
    }
}

impl ProgressHandler for ParametricStudyProgressHandler {
    fn update(&mut self, progress: &Progress) {
        if self.last_states.get(&progress.sim_id) == Some(&progress.state) {
            return;
        }
        debug!("Updating progress for {}", progress.sim_id);

        let id = progress.sim_id.as_str();
        match progress.state {
            ProgressState::New => {}
            ProgressState::Waiting => self.set_status(id, SimulationStatus::Pending, None),
            ProgressState::Cancelled => self.set_status(id, SimulationStatus::Cancelled, None),
            ProgressState::Running => self.set_status(id, SimulationStatus::Running, None),
            ProgressState::Warning => self.set_status(id, SimulationStatus::Warning, None),
            ProgressState::Error => {
                self.set_status(id, SimulationStatus::Error, Some(&progress.message))
            }
            ProgressState::Completed => {
                self.update_results(id);
                self.set_status(id, SimulationStatus::Completed, None);
            }
        }
        self.last_states
            .insert(progress.sim_id.clone(), progress.state);
    }
}
