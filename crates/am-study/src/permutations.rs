//! Options for generating parameter permutations.
//!
//! Lists left as `None` use the machine default. An empty list generates
//! nothing. These structs are also the YAML plan format read by the CLI.

use crate::columns::{DEFAULT_ITERATION, DEFAULT_PRIORITY};
use am_core::machine::limits;
use am_core::{microstructure, porosity, single_bead};
use serde::{Deserialize, Serialize};

pub(crate) fn values_or_default(values: &Option<Vec<f64>>, default: f64) -> Vec<f64> {
    match values {
        Some(v) => v.clone(),
        None => vec![default],
    }
}

/// Single bead sweep. The area energy density filter is
/// `laser_power / (scan_speed * layer_thickness)` in J/m^2.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleBeadPermutations {
    pub material_name: String,
    pub laser_powers: Vec<f64>,
    pub scan_speeds: Vec<f64>,
    pub bead_length: f64,
    pub layer_thicknesses: Option<Vec<f64>>,
    pub heater_temperatures: Option<Vec<f64>>,
    pub beam_diameters: Option<Vec<f64>>,
    pub min_area_energy_density: Option<f64>,
    pub max_area_energy_density: Option<f64>,
    pub iteration: i64,
    pub priority: i64,
}

impl Default for SingleBeadPermutations {
    fn default() -> Self {
        Self {
            material_name: String::new(),
            laser_powers: Vec::new(),
            scan_speeds: Vec::new(),
            bead_length: single_bead::DEFAULT_BEAD_LENGTH,
            layer_thicknesses: None,
            heater_temperatures: None,
            beam_diameters: None,
            min_area_energy_density: None,
            max_area_energy_density: None,
            iteration: DEFAULT_ITERATION,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl SingleBeadPermutations {
    pub(crate) fn layer_thicknesses(&self) -> Vec<f64> {
        values_or_default(&self.layer_thicknesses, limits::DEFAULT_LAYER_THICKNESS)
    }

    pub(crate) fn heater_temperatures(&self) -> Vec<f64> {
        values_or_default(&self.heater_temperatures, limits::DEFAULT_HEATER_TEMP)
    }

    pub(crate) fn beam_diameters(&self) -> Vec<f64> {
        values_or_default(&self.beam_diameters, limits::DEFAULT_BEAM_DIAMETER)
    }
}

/// Hatch settings and process window filters shared by the porosity and
/// microstructure sweeps. Energy density is in J/m^3, build rate in m^3/s.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HatchSweep {
    pub layer_thicknesses: Option<Vec<f64>>,
    pub heater_temperatures: Option<Vec<f64>>,
    pub beam_diameters: Option<Vec<f64>>,
    pub start_angles: Option<Vec<f64>>,
    pub rotation_angles: Option<Vec<f64>>,
    pub hatch_spacings: Option<Vec<f64>>,
    pub stripe_widths: Option<Vec<f64>>,
    pub min_energy_density: Option<f64>,
    pub max_energy_density: Option<f64>,
    pub min_build_rate: Option<f64>,
    pub max_build_rate: Option<f64>,
}

/// Expanded hatch sweep values.
pub(crate) struct HatchValues {
    pub layer_thicknesses: Vec<f64>,
    pub heater_temperatures: Vec<f64>,
    pub beam_diameters: Vec<f64>,
    pub start_angles: Vec<f64>,
    pub rotation_angles: Vec<f64>,
    pub hatch_spacings: Vec<f64>,
    pub stripe_widths: Vec<f64>,
}

impl HatchSweep {
    pub(crate) fn values(&self) -> HatchValues {
        HatchValues {
            layer_thicknesses: values_or_default(
                &self.layer_thicknesses,
                limits::DEFAULT_LAYER_THICKNESS,
            ),
            heater_temperatures: values_or_default(
                &self.heater_temperatures,
                limits::DEFAULT_HEATER_TEMP,
            ),
            beam_diameters: values_or_default(&self.beam_diameters, limits::DEFAULT_BEAM_DIAMETER),
            start_angles: values_or_default(
                &self.start_angles,
                limits::DEFAULT_STARTING_LAYER_ANGLE,
            ),
            rotation_angles: values_or_default(
                &self.rotation_angles,
                limits::DEFAULT_LAYER_ROTATION_ANGLE,
            ),
            hatch_spacings: values_or_default(&self.hatch_spacings, limits::DEFAULT_HATCH_SPACING),
            stripe_widths: values_or_default(
                &self.stripe_widths,
                limits::DEFAULT_SLICING_STRIPE_WIDTH,
            ),
        }
    }

    /// True when the build rate and energy density fall inside the filters.
    pub(crate) fn accepts(&self, build_rate: f64, energy_density: f64) -> bool {
        let min_br = self.min_build_rate.unwrap_or(0.0);
        let max_br = self.max_build_rate.unwrap_or(f64::INFINITY);
        let min_ed = self.min_energy_density.unwrap_or(0.0);
        let max_ed = self.max_energy_density.unwrap_or(f64::INFINITY);
        !(build_rate < min_br || build_rate > max_br || energy_density < min_ed || energy_density > max_ed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PorosityPermutations {
    pub material_name: String,
    pub laser_powers: Vec<f64>,
    pub scan_speeds: Vec<f64>,
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
    #[serde(flatten)]
    pub sweep: HatchSweep,
    pub iteration: i64,
    pub priority: i64,
}

impl Default for PorosityPermutations {
    fn default() -> Self {
        Self {
            material_name: String::new(),
            laser_powers: Vec::new(),
            scan_speeds: Vec::new(),
            size_x: porosity::DEFAULT_SAMPLE_SIZE,
            size_y: porosity::DEFAULT_SAMPLE_SIZE,
            size_z: porosity::DEFAULT_SAMPLE_SIZE,
            sweep: HatchSweep::default(),
            iteration: DEFAULT_ITERATION,
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// Microstructure sweep. When any thermal parameter is given, the others
/// take their defaults and the service uses the provided values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrostructurePermutations {
    pub material_name: String,
    pub laser_powers: Vec<f64>,
    pub scan_speeds: Vec<f64>,
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
    pub sensor_dimension: f64,
    #[serde(flatten)]
    pub sweep: HatchSweep,
    pub cooling_rate: Option<f64>,
    pub thermal_gradient: Option<f64>,
    pub melt_pool_width: Option<f64>,
    pub melt_pool_depth: Option<f64>,
    pub random_seed: Option<u64>,
    pub iteration: i64,
    pub priority: i64,
}

impl Default for MicrostructurePermutations {
    fn default() -> Self {
        Self {
            material_name: String::new(),
            laser_powers: Vec::new(),
            scan_speeds: Vec::new(),
            min_x: microstructure::DEFAULT_POSITION_COORDINATE,
            min_y: microstructure::DEFAULT_POSITION_COORDINATE,
            min_z: microstructure::DEFAULT_POSITION_COORDINATE,
            size_x: microstructure::DEFAULT_SAMPLE_SIZE,
            size_y: microstructure::DEFAULT_SAMPLE_SIZE,
            size_z: microstructure::DEFAULT_SAMPLE_SIZE,
            sensor_dimension: microstructure::DEFAULT_SENSOR_DIMENSION,
            sweep: HatchSweep::default(),
            cooling_rate: None,
            thermal_gradient: None,
            melt_pool_width: None,
            melt_pool_depth: None,
            random_seed: None,
            iteration: DEFAULT_ITERATION,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl MicrostructurePermutations {
    pub(crate) fn uses_thermal_parameters(&self) -> bool {
        self.cooling_rate.is_some()
            || self.thermal_gradient.is_some()
            || self.melt_pool_width.is_some()
            || self.melt_pool_depth.is_some()
    }
}

/// A permutation plan of any simulation type, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PermutationPlan {
    SingleBead(SingleBeadPermutations),
    Porosity(PorosityPermutations),
    Microstructure(MicrostructurePermutations),
}
