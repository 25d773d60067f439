//! Running the pending simulations of a study.

use crate::error::StudyResult;
use crate::row::StudyRow;
use am_client::{Additive, ProgressHandler};
use am_core::{SimulationInput, SimulationOutcome, SimulationStatus, SimulationType};
use tracing::{info, warn};

/// Which pending rows to run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunFilter {
    /// Simulation types to run. `None` runs every type.
    pub types: Option<Vec<SimulationType>>,
    pub priority: Option<i64>,
    pub iteration: Option<i64>,
}

impl RunFilter {
    pub fn matches(&self, row: &StudyRow) -> bool {
        row.status == SimulationStatus::Pending
            && self
                .types
                .as_ref()
                .is_none_or(|types| types.contains(&row.sim_type))
            && self.priority.is_none_or(|p| row.priority == p)
            && self.iteration.is_none_or(|i| row.iteration == i)
    }
}

pub struct ParametricRunner;

impl ParametricRunner {
    /// Pending rows selected by `filter`, lowest priority value first.
    pub fn select<'a>(rows: &'a [StudyRow], filter: &RunFilter) -> Vec<&'a StudyRow> {
        let mut selected: Vec<&StudyRow> = rows.iter().filter(|r| filter.matches(r)).collect();
        selected.sort_by_key(|r| r.priority);
        selected
    }

    /// Build inputs for the selected rows. Rows whose material the servers do
    /// not know, or whose values no longer validate, are skipped.
    pub fn inputs(
        rows: &[StudyRow],
        additive: &Additive,
        filter: &RunFilter,
    ) -> Vec<SimulationInput> {
        let mut inputs = Vec::new();
        for row in Self::select(rows, filter) {
            let material = match additive.material(&row.material) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Material {} not found, skipping {}: {e}", row.material, row.id);
                    continue;
                }
            };
            match row.simulation_input(material) {
                Ok(input) => inputs.push(input),
                Err(e) => warn!("Invalid parameters for {}, skipping: {e}", row.id),
            }
        }
        inputs
    }

    /// Run the selected pending rows and wait for them.
    pub fn simulate(
        rows: &[StudyRow],
        additive: &Additive,
        filter: &RunFilter,
        handler: Option<&mut dyn ProgressHandler>,
    ) -> StudyResult<Vec<SimulationOutcome>> {
        let inputs = Self::inputs(rows, additive, filter);
        if inputs.is_empty() {
            info!("None of the input simulations meet the criteria selected");
            return Ok(Vec::new());
        }
        Ok(additive.simulate(inputs, handler)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, sim_type: SimulationType, status: SimulationStatus, priority: i64) -> StudyRow {
        let mut row = StudyRow::new(sim_type, id, status, "IN718");
        row.priority = priority;
        row
    }

    #[test]
    fn select_filters_and_orders() {
        let rows = vec![
            row("a", SimulationType::SingleBead, SimulationStatus::Pending, 3),
            row("b", SimulationType::Porosity, SimulationStatus::Pending, 1),
            row("c", SimulationType::SingleBead, SimulationStatus::Completed, 1),
            row("d", SimulationType::SingleBead, SimulationStatus::Pending, 2),
        ];
        let all = ParametricRunner::select(&rows, &RunFilter::default());
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a"]);

        let filter = RunFilter {
            types: Some(vec![SimulationType::SingleBead]),
            priority: Some(2),
            ..Default::default()
        };
        let ids: Vec<&str> = ParametricRunner::select(&rows, &filter)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, ["d"]);
    }
}
