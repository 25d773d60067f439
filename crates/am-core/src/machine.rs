//! Machine settings used by every simulation type.
//!
//! Units are SI except angles (degrees) and the heater temperature (Celsius).
//! [`MachineMessage`] carries the service units: kelvin and radians.

use crate::numeric::validate_range;
use crate::units::{celsius_to_kelvin, degrees_to_radians, kelvin_to_celsius, radians_to_degrees};
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod limits {
    pub const DEFAULT_LASER_POWER: f64 = 195.0;
    pub const MIN_LASER_POWER: f64 = 50.0;
    pub const MAX_LASER_POWER: f64 = 700.0;

    pub const DEFAULT_SCAN_SPEED: f64 = 1.0;
    pub const MIN_SCAN_SPEED: f64 = 0.35;
    pub const MAX_SCAN_SPEED: f64 = 2.5;

    pub const DEFAULT_HEATER_TEMP: f64 = 80.0;
    pub const MIN_HEATER_TEMP: f64 = 20.0;
    pub const MAX_HEATER_TEMP: f64 = 500.0;

    pub const DEFAULT_LAYER_THICKNESS: f64 = 5e-5;
    pub const MIN_LAYER_THICKNESS: f64 = 1e-5;
    pub const MAX_LAYER_THICKNESS: f64 = 1e-4;

    pub const DEFAULT_BEAM_DIAMETER: f64 = 1e-4;
    pub const MIN_BEAM_DIAMETER: f64 = 2e-5;
    pub const MAX_BEAM_DIAMETER: f64 = 1.4e-4;

    pub const DEFAULT_STARTING_LAYER_ANGLE: f64 = 57.0;
    pub const MIN_STARTING_LAYER_ANGLE: f64 = 0.0;
    pub const MAX_STARTING_LAYER_ANGLE: f64 = 180.0;

    pub const DEFAULT_LAYER_ROTATION_ANGLE: f64 = 67.0;
    pub const MIN_LAYER_ROTATION_ANGLE: f64 = 0.0;
    pub const MAX_LAYER_ROTATION_ANGLE: f64 = 180.0;

    pub const DEFAULT_HATCH_SPACING: f64 = 1e-4;
    pub const MIN_HATCH_SPACING: f64 = 6e-5;
    pub const MAX_HATCH_SPACING: f64 = 2e-4;

    pub const DEFAULT_SLICING_STRIPE_WIDTH: f64 = 0.01;
    pub const MIN_SLICING_STRIPE_WIDTH: f64 = 0.001;
    pub const MAX_SLICING_STRIPE_WIDTH: f64 = 0.1;

    pub const DEFAULT_RING_COEFFICIENTS_SET_INDEX: u32 = 0;
    pub const MIN_RING_COEFFICIENTS_SET_INDEX: u32 = 0;
    pub const MAX_RING_COEFFICIENTS_SET_INDEX: u32 = 6;
}

use limits::*;

/// How the laser beam is modelled by the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatSourceModel {
    #[default]
    Gaussian,
    Ring,
}

impl HeatSourceModel {
    pub fn as_str(self) -> &'static str {
        match self {
            HeatSourceModel::Gaussian => "gaussian",
            HeatSourceModel::Ring => "ring",
        }
    }
}

impl fmt::Display for HeatSourceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeatSourceModel {
    type Err = CoreError;

    fn from_str(name: &str) -> CoreResult<Self> {
        match name {
            "gaussian" => Ok(HeatSourceModel::Gaussian),
            "ring" => Ok(HeatSourceModel::Ring),
            other => Err(CoreError::validation(format!(
                "Invalid heat_source_model name: {other}. Valid values are 'gaussian' and 'ring'."
            ))),
        }
    }
}

/// Unvalidated machine settings. Build an [`AdditiveMachine`] from these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineParams {
    pub laser_power: f64,
    pub scan_speed: f64,
    pub heater_temperature: f64,
    pub layer_thickness: f64,
    pub beam_diameter: f64,
    pub starting_layer_angle: f64,
    pub layer_rotation_angle: f64,
    pub hatch_spacing: f64,
    pub slicing_stripe_width: f64,
    pub heat_source_model: HeatSourceModel,
    pub ring_mode_coefficient_set_index: u32,
}

impl Default for MachineParams {
    fn default() -> Self {
        Self {
            laser_power: DEFAULT_LASER_POWER,
            scan_speed: DEFAULT_SCAN_SPEED,
            heater_temperature: DEFAULT_HEATER_TEMP,
            layer_thickness: DEFAULT_LAYER_THICKNESS,
            beam_diameter: DEFAULT_BEAM_DIAMETER,
            starting_layer_angle: DEFAULT_STARTING_LAYER_ANGLE,
            layer_rotation_angle: DEFAULT_LAYER_ROTATION_ANGLE,
            hatch_spacing: DEFAULT_HATCH_SPACING,
            slicing_stripe_width: DEFAULT_SLICING_STRIPE_WIDTH,
            heat_source_model: HeatSourceModel::Gaussian,
            ring_mode_coefficient_set_index: DEFAULT_RING_COEFFICIENTS_SET_INDEX,
        }
    }
}

/// Validated machine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MachineParams", into = "MachineParams")]
pub struct AdditiveMachine {
    laser_power: f64,
    scan_speed: f64,
    heater_temperature: f64,
    layer_thickness: f64,
    beam_diameter: f64,
    starting_layer_angle: f64,
    layer_rotation_angle: f64,
    hatch_spacing: f64,
    slicing_stripe_width: f64,
    heat_source_model: HeatSourceModel,
    ring_mode_coefficient_set_index: u32,
}

impl Default for AdditiveMachine {
    fn default() -> Self {
        let p = MachineParams::default();
        Self {
            laser_power: p.laser_power,
            scan_speed: p.scan_speed,
            heater_temperature: p.heater_temperature,
            layer_thickness: p.layer_thickness,
            beam_diameter: p.beam_diameter,
            starting_layer_angle: p.starting_layer_angle,
            layer_rotation_angle: p.layer_rotation_angle,
            hatch_spacing: p.hatch_spacing,
            slicing_stripe_width: p.slicing_stripe_width,
            heat_source_model: p.heat_source_model,
            ring_mode_coefficient_set_index: p.ring_mode_coefficient_set_index,
        }
    }
}

impl AdditiveMachine {
    pub fn new(params: MachineParams) -> CoreResult<Self> {
        let mut machine = Self::default();
        machine.set_laser_power(params.laser_power)?;
        machine.set_scan_speed(params.scan_speed)?;
        machine.set_heater_temperature(params.heater_temperature)?;
        machine.set_layer_thickness(params.layer_thickness)?;
        machine.set_beam_diameter(params.beam_diameter)?;
        machine.set_starting_layer_angle(params.starting_layer_angle)?;
        machine.set_layer_rotation_angle(params.layer_rotation_angle)?;
        machine.set_hatch_spacing(params.hatch_spacing)?;
        machine.set_slicing_stripe_width(params.slicing_stripe_width)?;
        machine.set_heat_source_model(params.heat_source_model);
        machine.set_ring_mode_coefficient_set_index(params.ring_mode_coefficient_set_index)?;
        Ok(machine)
    }

    pub fn params(&self) -> MachineParams {
        self.clone().into()
    }

    /// Scanning laser power (W).
    pub fn laser_power(&self) -> f64 {
        self.laser_power
    }

    pub fn set_laser_power(&mut self, value: f64) -> CoreResult<()> {
        self.laser_power = validate_range(value, MIN_LASER_POWER, MAX_LASER_POWER, "laser_power")?;
        Ok(())
    }

    /// Laser scanning speed (m/s).
    pub fn scan_speed(&self) -> f64 {
        self.scan_speed
    }

    pub fn set_scan_speed(&mut self, value: f64) -> CoreResult<()> {
        self.scan_speed = validate_range(value, MIN_SCAN_SPEED, MAX_SCAN_SPEED, "scan_speed")?;
        Ok(())
    }

    /// Build chamber heater temperature (C).
    pub fn heater_temperature(&self) -> f64 {
        self.heater_temperature
    }

    pub fn set_heater_temperature(&mut self, value: f64) -> CoreResult<()> {
        self.heater_temperature =
            validate_range(value, MIN_HEATER_TEMP, MAX_HEATER_TEMP, "heater_temperature")?;
        Ok(())
    }

    /// Powder layer thickness (m).
    pub fn layer_thickness(&self) -> f64 {
        self.layer_thickness
    }

    pub fn set_layer_thickness(&mut self, value: f64) -> CoreResult<()> {
        self.layer_thickness = validate_range(
            value,
            MIN_LAYER_THICKNESS,
            MAX_LAYER_THICKNESS,
            "layer_thickness",
        )?;
        Ok(())
    }

    /// D4σ beam diameter on the powder surface (m).
    pub fn beam_diameter(&self) -> f64 {
        self.beam_diameter
    }

    pub fn set_beam_diameter(&mut self, value: f64) -> CoreResult<()> {
        self.beam_diameter =
            validate_range(value, MIN_BEAM_DIAMETER, MAX_BEAM_DIAMETER, "beam_diameter")?;
        Ok(())
    }

    /// Scan angle of the first layer, counterclockwise from X (degrees).
    pub fn starting_layer_angle(&self) -> f64 {
        self.starting_layer_angle
    }

    pub fn set_starting_layer_angle(&mut self, value: f64) -> CoreResult<()> {
        self.starting_layer_angle = validate_range(
            value,
            MIN_STARTING_LAYER_ANGLE,
            MAX_STARTING_LAYER_ANGLE,
            "starting_layer_angle",
        )?;
        Ok(())
    }

    /// Change in scan angle from layer to layer (degrees).
    pub fn layer_rotation_angle(&self) -> f64 {
        self.layer_rotation_angle
    }

    pub fn set_layer_rotation_angle(&mut self, value: f64) -> CoreResult<()> {
        self.layer_rotation_angle = validate_range(
            value,
            MIN_LAYER_ROTATION_ANGLE,
            MAX_LAYER_ROTATION_ANGLE,
            "layer_rotation_angle",
        )?;
        Ok(())
    }

    /// Distance between adjacent scan vectors (m).
    pub fn hatch_spacing(&self) -> f64 {
        self.hatch_spacing
    }

    pub fn set_hatch_spacing(&mut self, value: f64) -> CoreResult<()> {
        self.hatch_spacing =
            validate_range(value, MIN_HATCH_SPACING, MAX_HATCH_SPACING, "hatch_spacing")?;
        Ok(())
    }

    /// Width of a stripe of scan lines within a layer (m).
    pub fn slicing_stripe_width(&self) -> f64 {
        self.slicing_stripe_width
    }

    pub fn set_slicing_stripe_width(&mut self, value: f64) -> CoreResult<()> {
        self.slicing_stripe_width = validate_range(
            value,
            MIN_SLICING_STRIPE_WIDTH,
            MAX_SLICING_STRIPE_WIDTH,
            "slicing_stripe_width",
        )?;
        Ok(())
    }

    pub fn heat_source_model(&self) -> HeatSourceModel {
        self.heat_source_model
    }

    pub fn set_heat_source_model(&mut self, model: HeatSourceModel) {
        self.heat_source_model = model;
    }

    /// Ring mode coefficient set, only used by the ring heat source.
    pub fn ring_mode_coefficient_set_index(&self) -> u32 {
        self.ring_mode_coefficient_set_index
    }

    pub fn set_ring_mode_coefficient_set_index(&mut self, index: u32) -> CoreResult<()> {
        if !(MIN_RING_COEFFICIENTS_SET_INDEX..=MAX_RING_COEFFICIENTS_SET_INDEX).contains(&index) {
            return Err(CoreError::validation(format!(
                "Invalid ring_mode_coefficient_set_index: {index}. Valid values are from 0 to 6."
            )));
        }
        self.ring_mode_coefficient_set_index = index;
        Ok(())
    }

    pub fn to_message(&self) -> MachineMessage {
        MachineMessage {
            laser_power: self.laser_power,
            scan_speed: self.scan_speed,
            heater_temperature: celsius_to_kelvin(self.heater_temperature),
            layer_thickness: self.layer_thickness,
            beam_diameter: self.beam_diameter,
            starting_layer_angle: degrees_to_radians(self.starting_layer_angle),
            layer_rotation_angle: degrees_to_radians(self.layer_rotation_angle),
            hatch_spacing: self.hatch_spacing,
            slicing_stripe_width: self.slicing_stripe_width,
            heat_source_model: self.heat_source_model,
            ring_mode_coefficient_set: self.ring_mode_coefficient_set_index,
        }
    }

    pub fn from_message(msg: &MachineMessage) -> CoreResult<Self> {
        Self::new(MachineParams {
            laser_power: msg.laser_power,
            scan_speed: msg.scan_speed,
            heater_temperature: kelvin_to_celsius(msg.heater_temperature),
            layer_thickness: msg.layer_thickness,
            beam_diameter: msg.beam_diameter,
            starting_layer_angle: radians_to_degrees(msg.starting_layer_angle),
            layer_rotation_angle: radians_to_degrees(msg.layer_rotation_angle),
            hatch_spacing: msg.hatch_spacing,
            slicing_stripe_width: msg.slicing_stripe_width,
            heat_source_model: msg.heat_source_model,
            ring_mode_coefficient_set_index: msg.ring_mode_coefficient_set,
        })
    }
}

impl TryFrom<MachineParams> for AdditiveMachine {
    type Error = CoreError;

    fn try_from(params: MachineParams) -> CoreResult<Self> {
        Self::new(params)
    }
}

impl From<AdditiveMachine> for MachineParams {
    fn from(m: AdditiveMachine) -> Self {
        Self {
            laser_power: m.laser_power,
            scan_speed: m.scan_speed,
            heater_temperature: m.heater_temperature,
            layer_thickness: m.layer_thickness,
            beam_diameter: m.beam_diameter,
            starting_layer_angle: m.starting_layer_angle,
            layer_rotation_angle: m.layer_rotation_angle,
            hatch_spacing: m.hatch_spacing,
            slicing_stripe_width: m.slicing_stripe_width,
            heat_source_model: m.heat_source_model,
            ring_mode_coefficient_set_index: m.ring_mode_coefficient_set_index,
        }
    }
}

impl fmt::Display for AdditiveMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AdditiveMachine")?;
        writeln!(f, "laser_power: {} W", self.laser_power)?;
        writeln!(f, "scan_speed: {} m/s", self.scan_speed)?;
        writeln!(f, "heater_temperature: {} °C", self.heater_temperature)?;
        writeln!(f, "layer_thickness: {} m", self.layer_thickness)?;
        writeln!(f, "beam_diameter: {} m", self.beam_diameter)?;
        writeln!(f, "starting_layer_angle: {} °", self.starting_layer_angle)?;
        writeln!(f, "layer_rotation_angle: {} °", self.layer_rotation_angle)?;
        writeln!(f, "hatch_spacing: {} m", self.hatch_spacing)?;
        writeln!(f, "slicing_stripe_width: {} m", self.slicing_stripe_width)?;
        writeln!(f, "heat_source_model: {}", self.heat_source_model)?;
        writeln!(
            f,
            "ring_mode_coefficient_set_index: {}",
            self.ring_mode_coefficient_set_index
        )
    }
}

/// Machine settings as sent to the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineMessage {
    pub laser_power: f64,
    pub scan_speed: f64,
    /// Kelvin.
    pub heater_temperature: f64,
    pub layer_thickness: f64,
    pub beam_diameter: f64,
    /// Radians.
    pub starting_layer_angle: f64,
    /// Radians.
    pub layer_rotation_angle: f64,
    pub hatch_spacing: f64,
    pub slicing_stripe_width: f64,
    pub heat_source_model: HeatSourceModel,
    pub ring_mode_coefficient_set: u32,
}
