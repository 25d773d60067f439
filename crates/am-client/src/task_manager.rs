//! Tracks a batch of simulation tasks.

use crate::error::ClientResult;
use crate::progress::{Progress, ProgressHandler, reborrow};
use crate::task::{DEFAULT_PROGRESS_UPDATE_INTERVAL, SimulationTask};
use am_core::{SimulationError, SimulationOutcome};
use std::time::Duration;
use tracing::warn;

pub struct SimulationTaskManager {
    tasks: Vec<SimulationTask>,
    /// Simulations that never reached a server.
    errors: Vec<SimulationError>,
    progress_update_interval: Duration,
}

impl Default for SimulationTaskManager {
    fn default() -> Self {
        Self::with_interval(DEFAULT_PROGRESS_UPDATE_INTERVAL)
    }
}

impl SimulationTaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// `interval` bounds each blocking wait between progress reports.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            errors: Vec::new(),
            progress_update_interval: interval,
        }
    }

    pub fn add_task(&mut self, task: SimulationTask) {
        self.tasks.push(task);
    }

    pub fn add_error(&mut self, error: SimulationError) {
        self.errors.push(error);
    }

    pub fn tasks(&self) -> &[SimulationTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Poll every task once. Returns `(operation name, progress)` pairs.
    pub fn status(
        &mut self,
        mut handler: Option<&mut dyn ProgressHandler>,
    ) -> ClientResult<Vec<(String, Progress)>> {
        let mut all = Vec::with_capacity(self.tasks.len());
        for task in &mut self.tasks {
            let progress = task.status()?;
            if let Some(h) = handler.as_deref_mut() {
                h.update(&progress);
            }
            all.push((task.operation_name().to_string(), progress));
        }
        Ok(all)
    }

    /// Wait on each task in turn. Finished tasks return immediately, so this
    /// lasts as long as the slowest simulation.
    ///
    /// Every task that was not cancelled has an outcome afterwards. A task
    /// whose operation could not be followed to the end is recorded as an
    /// error.
    pub fn wait_all(&mut self, mut handler: Option<&mut dyn ProgressHandler>) {
        let interval = self.progress_update_interval;
        for task in &mut self.tasks {
            if let Err(e) = task.wait(interval, reborrow(&mut handler)) {
                warn!("Failed to get final status of {}: {e}", task.simulation_id());
                task.fail(e.to_string());
            } else if task.summary().is_none() && !task.cancelled() {
                task.fail(format!(
                    "Simulation {} did not finish",
                    task.simulation_id()
                ));
            }
        }
    }

    pub fn done(&self) -> bool {
        self.tasks.iter().all(|t| t.done())
    }

    pub fn cancel_all(&self) {
        for task in self.tasks.iter().filter(|t| !t.done()) {
            if let Err(e) = task.cancel() {
                warn!("Failed to cancel {}: {e}", task.simulation_id());
            }
        }
    }

    /// Outcomes of finished tasks, followed by failed submissions.
    pub fn summaries(&self) -> Vec<SimulationOutcome> {
        self.tasks
            .iter()
            .filter_map(|t| t.summary().cloned())
            .chain(self.errors.iter().cloned().map(SimulationOutcome::Error))
            .collect()
    }
}
