//! One simulation in a parametric study.
//!
//! Numeric cells use NaN for blank, the same way the study table stores them.

use crate::columns::{Column, DEFAULT_ITERATION, DEFAULT_PRIORITY};
use crate::utils::{build_rate, energy_density};
use am_core::machine::limits;
use am_core::microstructure::{
    DEFAULT_COOLING_RATE, DEFAULT_MELT_POOL_DEPTH, DEFAULT_MELT_POOL_WIDTH,
    DEFAULT_POSITION_COORDINATE, DEFAULT_RANDOM_SEED, DEFAULT_THERMAL_GRADIENT, MAX_RANDOM_SEED,
    MIN_RANDOM_SEED,
};
use am_core::{
    AdditiveMachine, AdditiveMaterial, CoreError, CoreResult, MachineParams, MeltPool,
    MicrostructureInput, MicrostructureParams, PorosityInput, SimulationInput, SimulationStatus,
    SimulationSummary, SimulationType, SingleBeadInput,
};
use std::fmt;

/// Simulation types a study can hold.
pub const STUDY_TYPES: [SimulationType; 3] = [
    SimulationType::SingleBead,
    SimulationType::Porosity,
    SimulationType::Microstructure,
];

pub fn check_study_type(sim_type: SimulationType) -> Result<SimulationType, String> {
    if STUDY_TYPES.contains(&sim_type) {
        Ok(sim_type)
    } else {
        Err(format!("Invalid simulation type: {sim_type}."))
    }
}

/// A single table cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw text cell (CSV). Text columns stay text, numeric
    /// columns become numbers when they parse.
    pub fn parse(column: Column, raw: &str) -> Cell {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            return Cell::Empty;
        }
        if is_text_column(column) {
            return Cell::Text(raw.to_string());
        }
        match raw.parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Cell {
        match value {
            serde_json::Value::Null => Cell::Empty,
            serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            serde_json::Value::String(s) => Cell::Text(s.clone()),
            serde_json::Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Empty => serde_json::Value::Null,
            Cell::Number(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Cell::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    fn number(value: f64) -> Cell {
        if value.is_nan() {
            Cell::Empty
        } else {
            Cell::Number(value)
        }
    }

    fn text(value: &str) -> Cell {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

static EMPTY: Cell = Cell::Empty;

fn is_text_column(column: Column) -> bool {
    matches!(
        column,
        Column::Type | Column::Id | Column::Status | Column::Material | Column::ErrorMessage
    )
}

macro_rules! study_row {
    ($($column:ident => $field:ident),+ $(,)?) => {
        /// A row of the study table.
        #[derive(Clone, Debug, PartialEq)]
        pub struct StudyRow {
            pub iteration: i64,
            pub priority: i64,
            pub sim_type: SimulationType,
            pub id: String,
            pub status: SimulationStatus,
            pub material: String,
            $(pub $field: f64,)+
            pub error_message: String,
        }

        impl StudyRow {
            /// A row with every numeric cell blank.
            pub fn new(
                sim_type: SimulationType,
                id: impl Into<String>,
                status: SimulationStatus,
                material: impl Into<String>,
            ) -> Self {
                Self {
                    iteration: DEFAULT_ITERATION,
                    priority: DEFAULT_PRIORITY,
                    sim_type,
                    id: id.into(),
                    status,
                    material: material.into(),
                    $($field: f64::NAN,)+
                    error_message: String::new(),
                }
            }

            /// Numeric value of a float column. `None` for the other columns.
            pub fn value(&self, column: Column) -> Option<f64> {
                match column {
                    $(Column::$column => Some(self.$field),)+
                    _ => None,
                }
            }

            fn value_mut(&mut self, column: Column) -> Option<&mut f64> {
                match column {
                    $(Column::$column => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

study_row! {
    HeaterTemperature => heater_temperature,
    LayerThickness => layer_thickness,
    BeamDiameter => beam_diameter,
    LaserPower => laser_power,
    ScanSpeed => scan_speed,
    PvRatio => pv_ratio,
    StartAngle => start_angle,
    RotationAngle => rotation_angle,
    HatchSpacing => hatch_spacing,
    StripeWidth => stripe_width,
    EnergyDensity => energy_density,
    SingleBeadLength => single_bead_length,
    BuildRate => build_rate,
    MeltPoolWidth => melt_pool_width,
    MeltPoolDepth => melt_pool_depth,
    MeltPoolLength => melt_pool_length,
    MeltPoolLengthOverWidth => melt_pool_length_over_width,
    MeltPoolReferenceWidth => melt_pool_reference_width,
    MeltPoolReferenceDepth => melt_pool_reference_depth,
    MeltPoolReferenceDepthOverWidth => melt_pool_reference_depth_over_width,
    PorositySizeX => porosity_size_x,
    PorositySizeY => porosity_size_y,
    PorositySizeZ => porosity_size_z,
    RelativeDensity => relative_density,
    MicroMinX => micro_min_x,
    MicroMinY => micro_min_y,
    MicroMinZ => micro_min_z,
    MicroSizeX => micro_size_x,
    MicroSizeY => micro_size_y,
    MicroSizeZ => micro_size_z,
    MicroSensorDim => micro_sensor_dim,
    CoolingRate => cooling_rate,
    ThermalGradient => thermal_gradient,
    MicroMeltPoolWidth => micro_melt_pool_width,
    MicroMeltPoolDepth => micro_melt_pool_depth,
    RandomSeed => random_seed,
    XyAverageGrainSize => xy_average_grain_size,
    XzAverageGrainSize => xz_average_grain_size,
    YzAverageGrainSize => yz_average_grain_size,
}

fn or_default(value: f64, default: f64) -> f64 {
    if value.is_nan() { default } else { value }
}

impl StudyRow {
    pub fn get(&self, column: Column) -> Cell {
        match column {
            Column::Iteration => Cell::Number(self.iteration as f64),
            Column::Priority => Cell::Number(self.priority as f64),
            Column::Type => Cell::Text(self.sim_type.as_str().to_string()),
            Column::Id => Cell::text(&self.id),
            Column::Status => Cell::Text(self.status.as_str().to_string()),
            Column::Material => Cell::text(&self.material),
            Column::ErrorMessage => Cell::text(&self.error_message),
            other => Cell::number(self.value(other).unwrap_or(f64::NAN)),
        }
    }

    /// Cells in table order.
    pub fn cells(&self) -> Vec<Cell> {
        Column::ALL.iter().map(|c| self.get(*c)).collect()
    }

    /// Build a row from named cells. Missing columns stay blank. Errors carry
    /// the message shown to the user when a row is rejected.
    pub fn from_cells<'a, I>(cells: I) -> Result<StudyRow, String>
    where
        I: IntoIterator<Item = (Column, &'a Cell)>,
    {
        let cells: Vec<(Column, &Cell)> = cells.into_iter().collect();
        let find = |column: Column| {
            cells
                .iter()
                .find(|(c, _)| *c == column)
                .map(|(_, cell)| *cell)
                .unwrap_or(&EMPTY)
        };

        let status = match find(Column::Status) {
            Cell::Text(s) => s
                .parse::<SimulationStatus>()
                .map_err(|_| format!("Invalid simulation status {s}"))?,
            other => return Err(format!("Invalid simulation status {other}")),
        };
        let sim_type = match find(Column::Type) {
            Cell::Text(s) => check_study_type(
                s.parse::<SimulationType>().map_err(|e| e.to_string())?,
            )?,
            other => return Err(format!("Invalid simulation type: {other}.")),
        };

        let mut row = StudyRow::new(
            sim_type,
            cell_text(find(Column::Id)),
            status,
            cell_text(find(Column::Material)),
        );
        row.iteration =
            cell_integer(find(Column::Iteration), Column::Iteration, DEFAULT_ITERATION)?;
        row.priority = cell_integer(find(Column::Priority), Column::Priority, DEFAULT_PRIORITY)?;
        row.error_message = cell_text(find(Column::ErrorMessage));
        for (column, cell) in &cells {
            if let Some(slot) = row.value_mut(*column) {
                *slot = match cell {
                    Cell::Empty => f64::NAN,
                    Cell::Number(v) => *v,
                    Cell::Text(s) => {
                        return Err(format!(
                            "Invalid parameter combination: {column} must be a number, found {s}."
                        ));
                    }
                };
            }
        }
        Ok(row)
    }

    /// Set the machine columns and the process window metrics. Single bead
    /// rows use the track metrics without hatch spacing.
    pub fn set_machine(&mut self, machine: &AdditiveMachine) {
        self.heater_temperature = machine.heater_temperature();
        self.layer_thickness = machine.layer_thickness();
        self.beam_diameter = machine.beam_diameter();
        self.laser_power = machine.laser_power();
        self.scan_speed = machine.scan_speed();
        self.start_angle = machine.starting_layer_angle();
        self.rotation_angle = machine.layer_rotation_angle();
        self.hatch_spacing = machine.hatch_spacing();
        self.stripe_width = machine.slicing_stripe_width();
        self.update_metrics();
    }

    /// Recompute the PV ratio, build rate and energy density columns.
    pub fn update_metrics(&mut self) {
        let hatch = match self.sim_type {
            SimulationType::SingleBead => None,
            _ => Some(self.hatch_spacing),
        };
        self.pv_ratio = if self.scan_speed != 0.0 {
            self.laser_power / self.scan_speed
        } else {
            f64::NAN
        };
        self.build_rate = build_rate(self.scan_speed, self.layer_thickness, hatch);
        self.energy_density =
            energy_density(self.laser_power, self.scan_speed, self.layer_thickness, hatch);
    }

    /// Row for a simulation input waiting to run.
    pub fn from_input(
        input: &SimulationInput,
        iteration: i64,
        priority: i64,
        status: SimulationStatus,
    ) -> Self {
        let mut row = StudyRow::new(
            input.sim_type(),
            input.id(),
            status,
            input.material().name.clone(),
        );
        row.iteration = iteration;
        row.priority = priority;
        row.set_machine(input.machine());
        match input {
            SimulationInput::SingleBead(sb) => {
                row.single_bead_length = sb.bead_length();
            }
            SimulationInput::Porosity(p) => {
                row.porosity_size_x = p.size_x();
                row.porosity_size_y = p.size_y();
                row.porosity_size_z = p.size_z();
            }
            SimulationInput::Microstructure(m) => row.set_microstructure_params(m.params()),
            SimulationInput::ThermalHistory(_) => {}
        }
        row
    }

    /// Completed row for a finished simulation.
    pub fn from_summary(summary: &SimulationSummary, iteration: i64) -> Self {
        let mut row = StudyRow::from_input(
            &summary.input(),
            iteration,
            DEFAULT_PRIORITY,
            SimulationStatus::Completed,
        );
        match summary {
            SimulationSummary::SingleBead(s) => row.set_melt_pool(&s.melt_pool),
            SimulationSummary::Porosity(s) => row.relative_density = s.relative_density,
            SimulationSummary::Microstructure(s) => row.set_grain_sizes(
                s.xy_average_grain_size,
                s.xz_average_grain_size,
                s.yz_average_grain_size,
            ),
            SimulationSummary::ThermalHistory(_) => {}
        }
        row
    }

    fn set_microstructure_params(&mut self, p: &MicrostructureParams) {
        self.micro_min_x = p.sample_min_x;
        self.micro_min_y = p.sample_min_y;
        self.micro_min_z = p.sample_min_z;
        self.micro_size_x = p.sample_size_x;
        self.micro_size_y = p.sample_size_y;
        self.micro_size_z = p.sample_size_z;
        self.micro_sensor_dim = p.sensor_dimension;
        if p.use_provided_thermal_parameters {
            self.cooling_rate = p.cooling_rate;
            self.thermal_gradient = p.thermal_gradient;
            self.micro_melt_pool_width = p.melt_pool_width;
            self.micro_melt_pool_depth = p.melt_pool_depth;
        }
        if p.random_seed != DEFAULT_RANDOM_SEED {
            self.random_seed = p.random_seed as f64;
        }
    }

    pub fn set_melt_pool(&mut self, melt_pool: &MeltPool) {
        self.melt_pool_width = melt_pool.median_width();
        self.melt_pool_depth = melt_pool.median_depth();
        self.melt_pool_length = melt_pool.median_length();
        self.melt_pool_length_over_width = melt_pool.length_over_width();
        self.melt_pool_reference_width = melt_pool.median_reference_width();
        self.melt_pool_reference_depth = melt_pool.median_reference_depth();
        self.melt_pool_reference_depth_over_width = melt_pool.depth_over_width();
    }

    pub fn set_grain_sizes(&mut self, xy: f64, xz: f64, yz: f64) {
        self.xy_average_grain_size = xy;
        self.xz_average_grain_size = xz;
        self.yz_average_grain_size = yz;
    }

    fn machine_params(&self) -> MachineParams {
        MachineParams {
            laser_power: self.laser_power,
            scan_speed: self.scan_speed,
            heater_temperature: self.heater_temperature,
            layer_thickness: self.layer_thickness,
            beam_diameter: self.beam_diameter,
            starting_layer_angle: self.start_angle,
            layer_rotation_angle: self.rotation_angle,
            hatch_spacing: self.hatch_spacing,
            slicing_stripe_width: self.stripe_width,
            ..MachineParams::default()
        }
    }

    /// Machine for an imported row. Blank cells are rejected, except the
    /// hatch settings of single bead rows which do not use them.
    pub fn strict_machine(&self) -> CoreResult<AdditiveMachine> {
        let mut params = self.machine_params();
        if self.sim_type == SimulationType::SingleBead {
            fill_hatch_defaults(&mut params);
        }
        AdditiveMachine::new(params)
    }

    /// Machine with every blank cell replaced by its default.
    pub fn machine(&self) -> CoreResult<AdditiveMachine> {
        let mut params = self.machine_params();
        params.laser_power = or_default(params.laser_power, limits::DEFAULT_LASER_POWER);
        params.scan_speed = or_default(params.scan_speed, limits::DEFAULT_SCAN_SPEED);
        params.heater_temperature =
            or_default(params.heater_temperature, limits::DEFAULT_HEATER_TEMP);
        params.layer_thickness =
            or_default(params.layer_thickness, limits::DEFAULT_LAYER_THICKNESS);
        params.beam_diameter = or_default(params.beam_diameter, limits::DEFAULT_BEAM_DIAMETER);
        fill_hatch_defaults(&mut params);
        AdditiveMachine::new(params)
    }

    /// Check an imported row can be turned into a simulation input.
    pub fn validate(&self) -> Result<(), String> {
        let machine = self
            .strict_machine()
            .map_err(|e| format!("Invalid parameter combination: {e}"))?;
        let material = AdditiveMaterial {
            name: self.material.clone(),
            ..AdditiveMaterial::default()
        };
        self.build_input(machine, material, false)
            .map(|_| ())
            .map_err(|e| format!("Invalid parameter combination: {e}"))
    }

    /// Simulation input for a pending row, using the row ID.
    pub fn simulation_input(&self, material: AdditiveMaterial) -> CoreResult<SimulationInput> {
        let machine = self.machine()?;
        self.build_input(machine, material, true)
    }

    fn build_input(
        &self,
        machine: AdditiveMachine,
        material: AdditiveMaterial,
        fill_defaults: bool,
    ) -> CoreResult<SimulationInput> {
        match self.sim_type {
            SimulationType::SingleBead => Ok(SingleBeadInput::new(&self.id, machine, material)
                .with_bead_length(self.single_bead_length)?
                .into()),
            SimulationType::Porosity => Ok(PorosityInput::new(&self.id, machine, material)
                .with_size(self.porosity_size_x, self.porosity_size_y, self.porosity_size_z)?
                .into()),
            SimulationType::Microstructure => {
                let params = self.microstructure_params(fill_defaults)?;
                Ok(MicrostructureInput::new(&self.id, machine, material, params)?.into())
            }
            other => Err(CoreError::validation(format!(
                "Invalid simulation type: {other}."
            ))),
        }
    }

    fn microstructure_params(&self, fill_defaults: bool) -> CoreResult<MicrostructureParams> {
        let thermal = [
            self.cooling_rate,
            self.thermal_gradient,
            self.micro_melt_pool_width,
            self.micro_melt_pool_depth,
        ];
        // Pending rows use any thermal value given. Imported rows need all four.
        let use_provided = if fill_defaults {
            thermal.iter().any(|v| !v.is_nan())
        } else {
            thermal.iter().all(|v| !v.is_nan())
        };
        let position = |v: f64| {
            if fill_defaults {
                or_default(v, DEFAULT_POSITION_COORDINATE)
            } else {
                v
            }
        };
        Ok(MicrostructureParams {
            sample_min_x: position(self.micro_min_x),
            sample_min_y: position(self.micro_min_y),
            sample_min_z: position(self.micro_min_z),
            sample_size_x: self.micro_size_x,
            sample_size_y: self.micro_size_y,
            sample_size_z: self.micro_size_z,
            sensor_dimension: self.micro_sensor_dim,
            use_provided_thermal_parameters: use_provided,
            cooling_rate: or_default(self.cooling_rate, DEFAULT_COOLING_RATE),
            thermal_gradient: or_default(self.thermal_gradient, DEFAULT_THERMAL_GRADIENT),
            melt_pool_width: or_default(self.micro_melt_pool_width, DEFAULT_MELT_POOL_WIDTH),
            melt_pool_depth: or_default(self.micro_melt_pool_depth, DEFAULT_MELT_POOL_DEPTH),
            random_seed: seed_from_cell(self.random_seed)?,
        })
    }
}

fn fill_hatch_defaults(params: &mut MachineParams) {
    params.starting_layer_angle = or_default(
        params.starting_layer_angle,
        limits::DEFAULT_STARTING_LAYER_ANGLE,
    );
    params.layer_rotation_angle = or_default(
        params.layer_rotation_angle,
        limits::DEFAULT_LAYER_ROTATION_ANGLE,
    );
    params.hatch_spacing = or_default(params.hatch_spacing, limits::DEFAULT_HATCH_SPACING);
    params.slicing_stripe_width = or_default(
        params.slicing_stripe_width,
        limits::DEFAULT_SLICING_STRIPE_WIDTH,
    );
}

/// Blank seeds mean none was given.
fn seed_from_cell(value: f64) -> CoreResult<u64> {
    if value.is_nan() {
        return Ok(DEFAULT_RANDOM_SEED);
    }
    if value.fract() != 0.0 || value < 0.0 || value > MAX_RANDOM_SEED as f64 {
        return Err(CoreError::validation(format!(
            "random_seed must be between {MIN_RANDOM_SEED} and {MAX_RANDOM_SEED}."
        )));
    }
    Ok(value as u64)
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_integer(cell: &Cell, column: Column, default: i64) -> Result<i64, String> {
    match cell {
        Cell::Empty => Ok(default),
        Cell::Number(v) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i64),
        other => Err(format!("{column} must be an integer, found {other}.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_bead_row() -> StudyRow {
        let mut row = StudyRow::new(
            SimulationType::SingleBead,
            "sb_1",
            SimulationStatus::Pending,
            "IN718",
        );
        row.laser_power = 200.0;
        row.scan_speed = 1.0;
        row.heater_temperature = 80.0;
        row.layer_thickness = 5e-5;
        row.beam_diameter = 1e-4;
        row.single_bead_length = 3e-3;
        row
    }

    #[test]
    fn cells_follow_table_order() {
        let row = single_bead_row();
        let cells = row.cells();
        assert_eq!(cells.len(), Column::ALL.len());
        assert_eq!(cells[0], Cell::Number(0.0));
        assert_eq!(cells[2], Cell::Text("SingleBead".into()));
        assert_eq!(row.get(Column::HatchSpacing), Cell::Empty);
        assert_eq!(row.get(Column::ErrorMessage), Cell::Empty);
    }

    #[test]
    fn from_cells_reads_named_columns() {
        let cells = vec![
            (Column::Type, Cell::Text("Porosity".into())),
            (Column::Status, Cell::Text("Skip".into())),
            (Column::Id, Cell::Text("p1".into())),
            (Column::Priority, Cell::Number(4.0)),
            (Column::LaserPower, Cell::Number(250.0)),
        ];
        let row = StudyRow::from_cells(cells.iter().map(|(c, v)| (*c, v))).unwrap();
        assert_eq!(row.sim_type, SimulationType::Porosity);
        assert_eq!(row.status, SimulationStatus::Skip);
        assert_eq!(row.priority, 4);
        assert_eq!(row.iteration, DEFAULT_ITERATION);
        assert_eq!(row.laser_power, 250.0);
        assert!(row.scan_speed.is_nan());
    }

    #[test]
    fn from_cells_rejects_bad_type_and_status() {
        let bad_status = vec![
            (Column::Type, Cell::Text("SingleBead".into())),
            (Column::Status, Cell::Text("Done".into())),
        ];
        let err = StudyRow::from_cells(bad_status.iter().map(|(c, v)| (*c, v))).unwrap_err();
        assert_eq!(err, "Invalid simulation status Done");

        let bad_type = vec![
            (Column::Type, Cell::Text("Thermal".into())),
            (Column::Status, Cell::Text("Pending".into())),
        ];
        let err = StudyRow::from_cells(bad_type.iter().map(|(c, v)| (*c, v))).unwrap_err();
        assert_eq!(err, "Invalid simulation type: Thermal.");

        let thermal_history = vec![
            (Column::Type, Cell::Text("ThermalHistory".into())),
            (Column::Status, Cell::Text("Pending".into())),
        ];
        let err =
            StudyRow::from_cells(thermal_history.iter().map(|(c, v)| (*c, v))).unwrap_err();
        assert_eq!(err, "Invalid simulation type: ThermalHistory.");
    }

    #[test]
    fn cell_parse_keeps_text_columns() {
        assert_eq!(Cell::parse(Column::Material, "316"), Cell::Text("316".into()));
        assert_eq!(Cell::parse(Column::LaserPower, " 200 "), Cell::Number(200.0));
        assert_eq!(Cell::parse(Column::LaserPower, ""), Cell::Empty);
        assert_eq!(Cell::parse(Column::LaserPower, "NaN"), Cell::Empty);
    }

    #[test]
    fn single_bead_validation_defaults_hatch() {
        let row = single_bead_row();
        assert!(row.validate().is_ok());

        let mut porosity = row.clone();
        porosity.sim_type = SimulationType::Porosity;
        porosity.porosity_size_x = 3e-3;
        porosity.porosity_size_y = 3e-3;
        porosity.porosity_size_z = 3e-3;
        let err = porosity.validate().unwrap_err();
        assert!(err.starts_with("Invalid parameter combination: "), "{err}");
    }

    #[test]
    fn metrics_use_hatch_only_for_tracks() {
        let mut row = single_bead_row();
        row.hatch_spacing = 1e-4;
        row.update_metrics();
        assert_eq!(row.build_rate, 5e-5);
        assert_eq!(row.pv_ratio, 200.0);

        row.sim_type = SimulationType::Porosity;
        row.update_metrics();
        assert_eq!(row.build_rate, 5e-9);
    }

    #[test]
    fn pending_microstructure_uses_partial_thermal_values() {
        let mut row = single_bead_row();
        row.sim_type = SimulationType::Microstructure;
        row.start_angle = 57.0;
        row.rotation_angle = 67.0;
        row.hatch_spacing = 1e-4;
        row.stripe_width = 0.01;
        row.micro_size_x = 1.5e-3;
        row.micro_size_y = 1.5e-3;
        row.micro_size_z = 1.5e-3;
        row.micro_sensor_dim = 5e-4;
        row.cooling_rate = 2e6;

        let input = row.simulation_input(AdditiveMaterial::default()).unwrap();
        let SimulationInput::Microstructure(m) = input else {
            panic!("expected microstructure input");
        };
        assert!(m.use_provided_thermal_parameters());
        assert_eq!(m.cooling_rate(), 2e6);
        assert_eq!(m.thermal_gradient(), DEFAULT_THERMAL_GRADIENT);
        assert_eq!(m.random_seed(), DEFAULT_RANDOM_SEED);
        assert_eq!(m.id, "sb_1");

        // Imported rows need the full set before the values are used.
        assert!(row.validate().is_err());
        row.micro_min_x = 0.0;
        row.micro_min_y = 0.0;
        row.micro_min_z = 0.0;
        assert!(row.validate().is_ok());
    }

    #[test]
    fn random_seed_must_be_whole() {
        assert_eq!(seed_from_cell(f64::NAN).unwrap(), DEFAULT_RANDOM_SEED);
        assert_eq!(seed_from_cell(42.0).unwrap(), 42);
        assert!(seed_from_cell(1.5).is_err());
        assert!(seed_from_cell(-3.0).is_err());
    }
}
