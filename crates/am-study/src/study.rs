//! The parametric study: a table of simulations stored in a file.
//!
//! Every method that changes the table saves the study before returning.

use crate::columns::{Column, FORMAT_VERSION, column_names};
use crate::csv_io::{RawRow, read_study_csv, write_study_csv};
use crate::dedupe::remove_duplicates;
use crate::error::{StudyError, StudyResult};
use crate::migrate::{StudyFile, detect_version, migrate_to_latest};
use crate::permutations::{
    HatchSweep, MicrostructurePermutations, PermutationPlan, PorosityPermutations,
    SingleBeadPermutations,
};
use crate::progress_handler::ParametricStudyProgressHandler;
use crate::row::{Cell, StudyRow, check_study_type};
use crate::runner::{ParametricRunner, RunFilter};
use crate::utils::{build_rate, energy_density};
use am_client::{Additive, ProgressHandler};
use am_core::{
    AdditiveMachine, AdditiveMaterial, MachineParams, MeltPool, MicrostructureInput,
    MicrostructureParams, PorosityInput, SimulationInput, SimulationOutcome, SimulationStatus,
    SimulationSummary, SimulationType, SingleBeadInput, microstructure, new_sim_id,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Extension given to study files.
pub const STUDY_EXTENSION: &str = "ps";

/// Statuses accepted when importing rows. Completed rows replace matching
/// rows, the others only fill gaps.
const IMPORT_STATUSES: [(SimulationStatus, bool); 4] = [
    (SimulationStatus::Completed, true),
    (SimulationStatus::Pending, false),
    (SimulationStatus::Skip, false),
    (SimulationStatus::Error, false),
];

#[derive(Clone, Debug, PartialEq)]
pub struct ParametricStudy {
    file_name: PathBuf,
    format_version: u32,
    rows: Vec<StudyRow>,
}

fn with_study_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|e| e == STUDY_EXTENSION) {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(STUDY_EXTENSION);
        PathBuf::from(name)
    }
}

impl ParametricStudy {
    /// Open the study at `path`, creating it when the file does not exist.
    /// The `.ps` extension is added when missing.
    pub fn open(path: impl AsRef<Path>) -> StudyResult<Self> {
        let path = with_study_extension(path.as_ref());
        if path.exists() {
            Self::load(&path)
        } else {
            let study = Self {
                file_name: path,
                format_version: FORMAT_VERSION,
                rows: Vec::new(),
            };
            study.save()?;
            Ok(study)
        }
    }

    /// Load a study file, migrating older formats. A migrated study is
    /// written back in the latest format. The study keeps saving to `path`.
    pub fn load(path: impl AsRef<Path>) -> StudyResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StudyError::InvalidFile(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let file: StudyFile = serde_json::from_str(&content)
            .map_err(|_| StudyError::NotAStudy(path.to_path_buf()))?;
        let migrated = detect_version(&file) != FORMAT_VERSION;
        let file = migrate_to_latest(file)?;

        let columns: Vec<Option<Column>> =
            file.columns.iter().map(|name| Column::from_name(name)).collect();
        for (name, column) in file.columns.iter().zip(&columns) {
            if column.is_none() {
                warn!("Ignoring unknown column {name} in {}", path.display());
            }
        }

        let mut rows = Vec::with_capacity(file.rows.len());
        for values in &file.rows {
            let cells: Vec<(Column, Cell)> = columns
                .iter()
                .zip(values)
                .filter_map(|(column, value)| column.map(|c| (c, Cell::from_json(value))))
                .collect();
            let row = StudyRow::from_cells(cells.iter().map(|(c, v)| (*c, v))).map_err(|e| {
                StudyError::InvalidInput(format!("{}: {e}", path.display()))
            })?;
            rows.push(row);
        }

        debug!("Loaded {} simulations from {}", rows.len(), path.display());
        let study = Self {
            file_name: path.to_path_buf(),
            format_version: file.format_version,
            rows,
        };
        if migrated {
            study.save()?;
        }
        Ok(study)
    }

    pub fn save(&self) -> StudyResult<()> {
        if let Some(parent) = self.file_name.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = StudyFile {
            format_version: self.format_version,
            columns: column_names().into_iter().map(String::from).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| r.cells().iter().map(Cell::to_json).collect())
                .collect(),
        };
        std::fs::write(&self.file_name, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Save to a new file and keep saving there.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> StudyResult<()> {
        self.file_name = path.as_ref().to_path_buf();
        self.save()
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// A copy of the study table.
    pub fn data_frame(&self) -> Vec<StudyRow> {
        self.rows.clone()
    }

    pub fn rows(&self) -> &[StudyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: &str) -> Option<&StudyRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Add simulations from a study CSV. Returns a message for each rejected row.
    pub fn import_csv_study(&mut self, path: impl AsRef<Path>) -> StudyResult<Vec<String>> {
        let rows = read_study_csv(path.as_ref())?;
        self.add_simulations_from_data_frame(rows)
    }

    pub fn export_csv(&self, path: impl AsRef<Path>) -> StudyResult<()> {
        write_study_csv(path.as_ref(), &self.rows)
    }

    /// Run pending simulations and record their outcomes.
    pub fn run_simulations(
        &mut self,
        additive: &Additive,
        filter: &RunFilter,
        handler: Option<&mut dyn ProgressHandler>,
    ) -> StudyResult<Vec<SimulationOutcome>> {
        let outcomes = ParametricRunner::simulate(&self.rows, additive, filter, handler)?;
        self.update(&outcomes)?;
        Ok(outcomes)
    }

    /// Run pending simulations of a study shared with other threads.
    ///
    /// Rows are updated live through a [`ParametricStudyProgressHandler`]
    /// while the simulations run. The lock is not held while waiting.
    pub fn run_shared_simulations(
        study: &Arc<Mutex<Self>>,
        additive: &Additive,
        filter: &RunFilter,
    ) -> StudyResult<Vec<SimulationOutcome>> {
        let rows = lock(study).data_frame();
        let mut handler =
            ParametricStudyProgressHandler::new(Arc::clone(study), additive.servers().to_vec());
        let outcomes = ParametricRunner::simulate(&rows, additive, filter, Some(&mut handler))?;
        lock(study).update(&outcomes)?;
        Ok(outcomes)
    }

    /// Add completed simulations. A summary matching an existing simulation
    /// replaces it. Returns the number of simulations added.
    pub fn add_summaries(
        &mut self,
        summaries: &[SimulationSummary],
        iteration: i64,
    ) -> StudyResult<usize> {
        for summary in summaries {
            ensure_study_type(summary.sim_type())?;
        }
        for summary in summaries {
            let mut row = StudyRow::from_summary(summary, iteration);
            row.id = self.create_unique_id(None, Some(summary.id()));
            self.rows.push(row);
        }
        let removed = remove_duplicates(&mut self.rows, true);
        self.save()?;
        Ok(summaries.len().saturating_sub(removed))
    }

    /// Add pending single bead simulations for every combination whose area
    /// energy density lies within the limits. Returns the number added.
    pub fn generate_single_bead_permutations(
        &mut self,
        options: &SingleBeadPermutations,
    ) -> StudyResult<usize> {
        let min_aed = options.min_area_energy_density.unwrap_or(0.0);
        let max_aed = options.max_area_energy_density.unwrap_or(f64::INFINITY);
        let prefix = format!("sb_{}", options.iteration);
        let mut added = 0;

        for &p in &options.laser_powers {
            for &v in &options.scan_speeds {
                for l in options.layer_thicknesses() {
                    let aed = energy_density(p, v, l, None);
                    if aed < min_aed || aed > max_aed {
                        continue;
                    }
                    for t in options.heater_temperatures() {
                        for d in options.beam_diameters() {
                            let params = MachineParams {
                                laser_power: p,
                                scan_speed: v,
                                heater_temperature: t,
                                layer_thickness: l,
                                beam_diameter: d,
                                ..MachineParams::default()
                            };
                            let checked = AdditiveMachine::new(params).and_then(|machine| {
                                SingleBeadInput::new("", machine, AdditiveMaterial::default())
                                    .with_bead_length(options.bead_length)
                            });
                            if let Err(e) = checked {
                                warn!("Invalid parameter combination: {e}");
                                continue;
                            }

                            let id = self.create_unique_id(Some(&prefix), None);
                            let mut row = StudyRow::new(
                                SimulationType::SingleBead,
                                id,
                                SimulationStatus::Pending,
                                options.material_name.as_str(),
                            );
                            row.iteration = options.iteration;
                            row.priority = options.priority;
                            row.heater_temperature = t;
                            row.layer_thickness = l;
                            row.beam_diameter = d;
                            row.laser_power = p;
                            row.scan_speed = v;
                            row.single_bead_length = options.bead_length;
                            row.update_metrics();
                            self.rows.push(row);
                            added += 1;
                        }
                    }
                }
            }
        }
        self.save()?;
        Ok(added)
    }

    /// Add pending porosity simulations for every combination within the
    /// energy density and build rate limits. Returns the number added.
    pub fn generate_porosity_permutations(
        &mut self,
        options: &PorosityPermutations,
    ) -> StudyResult<usize> {
        let prefix = format!("por_{}", options.iteration);
        let mut added = 0;
        for machine in hatch_machines(&options.laser_powers, &options.scan_speeds, &options.sweep) {
            let checked = PorosityInput::new("", machine.clone(), AdditiveMaterial::default())
                .with_size(options.size_x, options.size_y, options.size_z);
            if let Err(e) = checked {
                warn!("Invalid parameter combination: {e}");
                continue;
            }

            let id = self.create_unique_id(Some(&prefix), None);
            let mut row = StudyRow::new(
                SimulationType::Porosity,
                id,
                SimulationStatus::Pending,
                options.material_name.as_str(),
            );
            row.iteration = options.iteration;
            row.priority = options.priority;
            row.set_machine(&machine);
            row.porosity_size_x = options.size_x;
            row.porosity_size_y = options.size_y;
            row.porosity_size_z = options.size_z;
            self.rows.push(row);
            added += 1;
        }
        self.save()?;
        Ok(added)
    }

    /// Add pending microstructure simulations for every combination within
    /// the energy density and build rate limits. Returns the number added.
    pub fn generate_microstructure_permutations(
        &mut self,
        options: &MicrostructurePermutations,
    ) -> StudyResult<usize> {
        let use_thermal = options.uses_thermal_parameters();
        let params = MicrostructureParams {
            sample_min_x: options.min_x,
            sample_min_y: options.min_y,
            sample_min_z: options.min_z,
            sample_size_x: options.size_x,
            sample_size_y: options.size_y,
            sample_size_z: options.size_z,
            sensor_dimension: options.sensor_dimension,
            use_provided_thermal_parameters: use_thermal,
            cooling_rate: options
                .cooling_rate
                .unwrap_or(microstructure::DEFAULT_COOLING_RATE),
            thermal_gradient: options
                .thermal_gradient
                .unwrap_or(microstructure::DEFAULT_THERMAL_GRADIENT),
            melt_pool_width: options
                .melt_pool_width
                .unwrap_or(microstructure::DEFAULT_MELT_POOL_WIDTH),
            melt_pool_depth: options
                .melt_pool_depth
                .unwrap_or(microstructure::DEFAULT_MELT_POOL_DEPTH),
            random_seed: options
                .random_seed
                .unwrap_or(microstructure::DEFAULT_RANDOM_SEED),
        };
        // Thermal cells stay blank unless the service is told to use them.
        let thermal_cell = |value: f64| if use_thermal { value } else { f64::NAN };

        let prefix = format!("micro_{}", options.iteration);
        let mut added = 0;
        for machine in hatch_machines(&options.laser_powers, &options.scan_speeds, &options.sweep) {
            let checked = MicrostructureInput::new(
                "",
                machine.clone(),
                AdditiveMaterial::default(),
                params.clone(),
            );
            if let Err(e) = checked {
                warn!("Invalid parameter combination: {e}");
                continue;
            }

            let id = self.create_unique_id(Some(&prefix), None);
            let mut row = StudyRow::new(
                SimulationType::Microstructure,
                id,
                SimulationStatus::Pending,
                options.material_name.as_str(),
            );
            row.iteration = options.iteration;
            row.priority = options.priority;
            row.set_machine(&machine);
            row.micro_min_x = options.min_x;
            row.micro_min_y = options.min_y;
            row.micro_min_z = options.min_z;
            row.micro_size_x = options.size_x;
            row.micro_size_y = options.size_y;
            row.micro_size_z = options.size_z;
            row.micro_sensor_dim = options.sensor_dimension;
            row.cooling_rate = thermal_cell(params.cooling_rate);
            row.thermal_gradient = thermal_cell(params.thermal_gradient);
            row.micro_melt_pool_width = thermal_cell(params.melt_pool_width);
            row.micro_melt_pool_depth = thermal_cell(params.melt_pool_depth);
            row.random_seed = options.random_seed.map_or(f64::NAN, |s| s as f64);
            self.rows.push(row);
            added += 1;
        }
        self.save()?;
        Ok(added)
    }

    /// Generate permutations from a plan of any type.
    pub fn generate(&mut self, plan: &PermutationPlan) -> StudyResult<usize> {
        match plan {
            PermutationPlan::SingleBead(o) => self.generate_single_bead_permutations(o),
            PermutationPlan::Porosity(o) => self.generate_porosity_permutations(o),
            PermutationPlan::Microstructure(o) => self.generate_microstructure_permutations(o),
        }
    }

    /// Record outcomes of simulations already in the study. Summaries match
    /// on ID and type, errors on ID alone.
    pub fn update(&mut self, outcomes: &[SimulationOutcome]) -> StudyResult<()> {
        for outcome in outcomes {
            if let SimulationOutcome::Summary(summary) = outcome {
                ensure_study_type(summary.sim_type())?;
            }
        }
        for outcome in outcomes {
            match outcome {
                SimulationOutcome::Summary(summary) => {
                    let id = summary.id();
                    let sim_type = summary.sim_type();
                    for row in self
                        .rows
                        .iter_mut()
                        .filter(|r| r.id == id && r.sim_type == sim_type)
                    {
                        row.status = SimulationStatus::Completed;
                        match summary {
                            SimulationSummary::SingleBead(s) => row.set_melt_pool(&s.melt_pool),
                            SimulationSummary::Porosity(s) => {
                                row.relative_density = s.relative_density
                            }
                            SimulationSummary::Microstructure(s) => row.set_grain_sizes(
                                s.xy_average_grain_size,
                                s.xz_average_grain_size,
                                s.yz_average_grain_size,
                            ),
                            SimulationSummary::ThermalHistory(_) => {}
                        }
                    }
                }
                SimulationOutcome::Error(error) => {
                    let id = error.input.id();
                    for row in self.rows.iter_mut().filter(|r| r.id == id) {
                        row.status = SimulationStatus::Error;
                        row.error_message = error.message.clone();
                    }
                }
            }
        }
        self.save()
    }

    pub fn update_single_bead_results(&mut self, id: &str, melt_pool: &MeltPool) -> StudyResult<()> {
        self.update_rows(id, SimulationType::SingleBead, |row| row.set_melt_pool(melt_pool))
    }

    pub fn update_porosity_results(&mut self, id: &str, relative_density: f64) -> StudyResult<()> {
        self.update_rows(id, SimulationType::Porosity, |row| {
            row.relative_density = relative_density
        })
    }

    pub fn update_microstructure_results(
        &mut self,
        id: &str,
        xy_average_grain_size: f64,
        xz_average_grain_size: f64,
        yz_average_grain_size: f64,
    ) -> StudyResult<()> {
        self.update_rows(id, SimulationType::Microstructure, |row| {
            row.set_grain_sizes(
                xy_average_grain_size,
                xz_average_grain_size,
                yz_average_grain_size,
            )
        })
    }

    fn update_rows(
        &mut self,
        id: &str,
        sim_type: SimulationType,
        mut f: impl FnMut(&mut StudyRow),
    ) -> StudyResult<()> {
        for row in self
            .rows
            .iter_mut()
            .filter(|r| r.id == id && r.sim_type == sim_type)
        {
            f(row);
        }
        self.save()
    }

    /// Set the status of one simulation. A message replaces the error message.
    pub fn set_simulation_status(
        &mut self,
        id: &str,
        status: SimulationStatus,
        message: Option<&str>,
    ) -> StudyResult<()> {
        for row in self.rows.iter_mut().filter(|r| r.id == id) {
            row.status = status;
            if let Some(message) = message {
                row.error_message = message.to_string();
            }
        }
        self.save()
    }

    /// Add simulation inputs as new rows. Inputs matching an existing
    /// simulation are dropped. Returns the number added.
    pub fn add_inputs(
        &mut self,
        inputs: &[SimulationInput],
        iteration: i64,
        priority: i64,
        status: SimulationStatus,
    ) -> StudyResult<usize> {
        if !matches!(status, SimulationStatus::Pending | SimulationStatus::Skip) {
            return Err(StudyError::InvalidInput(
                "Simulation status must be 'Pending' or 'Skip'".to_string(),
            ));
        }
        for input in inputs {
            ensure_study_type(input.sim_type())?;
        }
        for input in inputs {
            let mut row = StudyRow::from_input(input, iteration, priority, status);
            row.id = self.create_unique_id(None, Some(input.id()));
            self.rows.push(row);
        }
        let removed = remove_duplicates(&mut self.rows, false);
        self.save()?;
        Ok(inputs.len().saturating_sub(removed))
    }

    pub fn remove<S: AsRef<str>>(&mut self, ids: &[S]) -> StudyResult<()> {
        self.rows
            .retain(|r| !ids.iter().any(|id| id.as_ref() == r.id));
        self.save()
    }

    pub fn set_status<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        status: SimulationStatus,
    ) -> StudyResult<()> {
        self.for_ids(ids, |row| row.status = status)
    }

    pub fn set_priority<S: AsRef<str>>(&mut self, ids: &[S], priority: i64) -> StudyResult<()> {
        self.for_ids(ids, |row| row.priority = priority)
    }

    pub fn set_iteration<S: AsRef<str>>(&mut self, ids: &[S], iteration: i64) -> StudyResult<()> {
        self.for_ids(ids, |row| row.iteration = iteration)
    }

    fn for_ids<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        mut f: impl FnMut(&mut StudyRow),
    ) -> StudyResult<()> {
        for row in self
            .rows
            .iter_mut()
            .filter(|r| ids.iter().any(|id| id.as_ref() == r.id))
        {
            f(row);
        }
        self.save()
    }

    /// Remove every simulation.
    pub fn clear(&mut self) -> StudyResult<()> {
        self.rows.clear();
        self.save()
    }

    /// An ID no existing simulation ID starts with. `id` is used as is when
    /// possible, otherwise it becomes the prefix of a generated ID.
    pub fn create_unique_id(&self, prefix: Option<&str>, id: Option<&str>) -> String {
        let taken = |candidate: &str| self.rows.iter().any(|r| r.id.starts_with(candidate));
        if let Some(id) = id
            && !id.is_empty()
            && !taken(id)
        {
            return id.to_string();
        }
        let base = id
            .filter(|s| !s.is_empty())
            .or(prefix)
            .unwrap_or("sim");
        loop {
            let candidate = format!("{base}_{}", new_sim_id());
            if !taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Add rows read from a file. Each row is validated; rejected rows are
    /// reported, not added. Returns the messages for rejected rows, plus a
    /// note when duplicates were dropped.
    pub fn add_simulations_from_data_frame(
        &mut self,
        rows: Vec<RawRow>,
    ) -> StudyResult<Vec<String>> {
        let checked: Vec<Result<StudyRow, String>> = rows
            .par_iter()
            .map(|cells| {
                let row = StudyRow::from_cells(cells.iter().map(|(c, v)| (*c, v)))?;
                if !IMPORT_STATUSES.iter().any(|(s, _)| *s == row.status) {
                    return Err(format!("Invalid simulation status {}", row.status));
                }
                row.validate()?;
                Ok(row)
            })
            .collect();

        let mut errors = Vec::new();
        let mut valid = Vec::new();
        for result in checked {
            match result {
                Ok(row) => valid.push(row),
                Err(e) => errors.push(e),
            }
        }

        let mut duplicates = 0;
        for (status, overwrite) in IMPORT_STATUSES {
            let group: Vec<StudyRow> = valid.iter().filter(|r| r.status == status).cloned().collect();
            if group.is_empty() {
                continue;
            }
            self.rows.extend(group);
            duplicates += remove_duplicates(&mut self.rows, overwrite);
        }
        if duplicates > 0 {
            errors.push(format!("Removed {duplicates} duplicate simulation(s)."));
        }
        info!(
            "Added {} simulations to {}",
            valid.len().saturating_sub(duplicates),
            self.file_name.display()
        );
        self.save()?;
        Ok(errors)
    }
}

/// Valid machines for a hatch sweep, in loop order: power, speed, layer
/// thickness, hatch spacing, then heater temperature, beam diameter, start
/// angle, rotation angle and stripe width.
fn hatch_machines(
    laser_powers: &[f64],
    scan_speeds: &[f64],
    sweep: &HatchSweep,
) -> Vec<AdditiveMachine> {
    let values = sweep.values();
    let mut machines = Vec::new();
    for &p in laser_powers {
        for &v in scan_speeds {
            for &l in &values.layer_thicknesses {
                for &h in &values.hatch_spacings {
                    let br = build_rate(v, l, Some(h));
                    let ed = energy_density(p, v, l, Some(h));
                    if !sweep.accepts(br, ed) {
                        continue;
                    }
                    for &t in &values.heater_temperatures {
                        for &d in &values.beam_diameters {
                            for &a in &values.start_angles {
                                for &r in &values.rotation_angles {
                                    for &w in &values.stripe_widths {
                                        let params = MachineParams {
                                            laser_power: p,
                                            scan_speed: v,
                                            heater_temperature: t,
                                            layer_thickness: l,
                                            beam_diameter: d,
                                            starting_layer_angle: a,
                                            layer_rotation_angle: r,
                                            hatch_spacing: h,
                                            slicing_stripe_width: w,
                                            ..MachineParams::default()
                                        };
                                        match AdditiveMachine::new(params) {
                                            Ok(m) => machines.push(m),
                                            Err(e) => warn!("Invalid parameter combination: {e}"),
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    machines
}

fn ensure_study_type(sim_type: SimulationType) -> StudyResult<()> {
    check_study_type(sim_type)
        .map(|_| ())
        .map_err(StudyError::InvalidInput)
}

fn lock(study: &Mutex<ParametricStudy>) -> MutexGuard<'_, ParametricStudy> {
    study.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_study(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("am_study_unit_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(with_study_extension(&path));
        path
    }

    #[test]
    fn open_adds_extension_and_creates_file() {
        let path = temp_study("created");
        let study = ParametricStudy::open(&path).unwrap();
        assert_eq!(study.file_name().extension().unwrap(), "ps");
        assert!(study.file_name().is_file());
        assert_eq!(study.format_version(), FORMAT_VERSION);
        assert!(study.is_empty());
    }

    #[test]
    fn unique_ids_avoid_prefix_collisions() {
        let path = temp_study("ids");
        let mut study = ParametricStudy::open(&path).unwrap();
        assert_eq!(study.create_unique_id(None, Some("run")), "run");

        study.rows.push(StudyRow::new(
            SimulationType::SingleBead,
            "run_long",
            SimulationStatus::Pending,
            "IN718",
        ));
        let id = study.create_unique_id(None, Some("run"));
        assert!(id.starts_with("run_"));
        assert_ne!(id, "run_long");

        let generated = study.create_unique_id(Some("sb_0"), None);
        assert!(generated.starts_with("sb_0_"));
        assert!(study.create_unique_id(None, None).starts_with("sim_"));
    }

    #[test]
    fn add_inputs_rejects_other_statuses() {
        let path = temp_study("statuses");
        let mut study = ParametricStudy::open(&path).unwrap();
        let err = study
            .add_inputs(&[], 0, 1, SimulationStatus::Completed)
            .unwrap_err();
        assert_eq!(err.to_string(), "Simulation status must be 'Pending' or 'Skip'");
    }
}
