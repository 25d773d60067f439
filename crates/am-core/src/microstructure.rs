//! 2D microstructure simulation input and grain statistics.

use crate::ids::new_sim_id;
use crate::machine::AdditiveMachine;
use crate::material::AdditiveMaterial;
use crate::numeric::validate_range;
use crate::request::{MicrostructureInputMessage, RequestInput, SimulationRequest};
use crate::simulation::SimulationStatus;
use crate::units::{TemperatureGradient, TemperatureRate, kpm, kps, radians_to_degrees};
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_POSITION_COORDINATE: f64 = 0.0;
pub const MIN_POSITION_COORDINATE: f64 = 0.0;
pub const MAX_POSITION_COORDINATE: f64 = 10.0;
pub const DEFAULT_SAMPLE_SIZE: f64 = 1.5e-3;
pub const MIN_SAMPLE_SIZE: f64 = 0.001;
pub const MAX_SAMPLE_SIZE: f64 = 0.01;
pub const DEFAULT_SENSOR_DIMENSION: f64 = 5e-4;
pub const MIN_SENSOR_DIMENSION: f64 = 1e-4;
pub const MAX_SENSOR_DIMENSION: f64 = 1e-3;
/// Minimum amount the X and Y sample sizes must exceed the sensor dimension by (m).
pub const MIN_XY_SIZE_CUSHION: f64 = 5e-4;
/// Minimum amount the Z sample size must exceed the sensor dimension by (m).
pub const MIN_Z_SIZE_CUSHION: f64 = 1e-3;
pub const DEFAULT_COOLING_RATE: f64 = 1e6;
pub const MIN_COOLING_RATE: f64 = 1e5;
pub const MAX_COOLING_RATE: f64 = 1e7;
pub const DEFAULT_THERMAL_GRADIENT: f64 = 1e7;
pub const MIN_THERMAL_GRADIENT: f64 = 1e5;
pub const MAX_THERMAL_GRADIENT: f64 = 1e8;
pub const DEFAULT_MELT_POOL_WIDTH: f64 = 1.5e-4;
pub const MIN_MELT_POOL_WIDTH: f64 = 7.5e-5;
pub const MAX_MELT_POOL_WIDTH: f64 = 8e-4;
pub const DEFAULT_MELT_POOL_DEPTH: f64 = 1e-4;
pub const MIN_MELT_POOL_DEPTH: f64 = 1.5e-5;
pub const MAX_MELT_POOL_DEPTH: f64 = 8e-4;
/// A seed of zero lets the service pick one.
pub const DEFAULT_RANDOM_SEED: u64 = 0;
pub const MIN_RANDOM_SEED: u64 = 1;
pub const MAX_RANDOM_SEED: u64 = (1 << 32) - 1;

/// Unvalidated microstructure settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrostructureParams {
    pub sample_min_x: f64,
    pub sample_min_y: f64,
    pub sample_min_z: f64,
    pub sample_size_x: f64,
    pub sample_size_y: f64,
    pub sample_size_z: f64,
    pub sensor_dimension: f64,
    pub use_provided_thermal_parameters: bool,
    pub cooling_rate: f64,
    pub thermal_gradient: f64,
    pub melt_pool_width: f64,
    pub melt_pool_depth: f64,
    pub random_seed: u64,
}

impl Default for MicrostructureParams {
    fn default() -> Self {
        Self {
            sample_min_x: DEFAULT_POSITION_COORDINATE,
            sample_min_y: DEFAULT_POSITION_COORDINATE,
            sample_min_z: DEFAULT_POSITION_COORDINATE,
            sample_size_x: DEFAULT_SAMPLE_SIZE,
            sample_size_y: DEFAULT_SAMPLE_SIZE,
            sample_size_z: DEFAULT_SAMPLE_SIZE,
            sensor_dimension: DEFAULT_SENSOR_DIMENSION,
            use_provided_thermal_parameters: false,
            cooling_rate: DEFAULT_COOLING_RATE,
            thermal_gradient: DEFAULT_THERMAL_GRADIENT,
            melt_pool_width: DEFAULT_MELT_POOL_WIDTH,
            melt_pool_depth: DEFAULT_MELT_POOL_DEPTH,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureInput {
    pub id: String,
    pub machine: AdditiveMachine,
    pub material: AdditiveMaterial,
    params: MicrostructureParams,
}

impl Default for MicrostructureInput {
    fn default() -> Self {
        Self {
            id: new_sim_id(),
            machine: AdditiveMachine::default(),
            material: AdditiveMaterial::default(),
            params: MicrostructureParams::default(),
        }
    }
}

fn validate_size(size: f64, sensor: f64, cushion: f64, name: &str) -> CoreResult<f64> {
    if size.is_nan() {
        return Err(CoreError::validation(format!("{name} must be a number.")));
    }
    if size - sensor < cushion {
        return Err(CoreError::validation(format!(
            "{name} must be at least {cushion} larger than sensor_dimension."
        )));
    }
    Ok(size)
}

impl MicrostructureInput {
    pub fn new(
        id: impl Into<String>,
        machine: AdditiveMachine,
        material: AdditiveMaterial,
        params: MicrostructureParams,
    ) -> CoreResult<Self> {
        let id = id.into();
        let mut input = Self {
            id: if id.is_empty() { new_sim_id() } else { id },
            machine,
            material,
            params: MicrostructureParams::default(),
        };

        // Sensor dimension and sample sizes constrain each other, so check them as a set.
        let p = &params;
        validate_range(
            p.sensor_dimension,
            MIN_SENSOR_DIMENSION,
            MAX_SENSOR_DIMENSION,
            "sensor_dimension",
        )?;
        for (size, cushion, name) in [
            (p.sample_size_x, MIN_XY_SIZE_CUSHION, "sample_size_x"),
            (p.sample_size_y, MIN_XY_SIZE_CUSHION, "sample_size_y"),
            (p.sample_size_z, MIN_Z_SIZE_CUSHION, "sample_size_z"),
        ] {
            validate_range(size, MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, name)?;
            validate_size(size, p.sensor_dimension, cushion, name)?;
        }
        input.params.sensor_dimension = p.sensor_dimension;
        input.params.sample_size_x = p.sample_size_x;
        input.params.sample_size_y = p.sample_size_y;
        input.params.sample_size_z = p.sample_size_z;

        input.set_sample_min_x(p.sample_min_x)?;
        input.set_sample_min_y(p.sample_min_y)?;
        input.set_sample_min_z(p.sample_min_z)?;
        input.set_use_provided_thermal_parameters(p.use_provided_thermal_parameters);
        input.set_cooling_rate(p.cooling_rate)?;
        input.set_thermal_gradient(p.thermal_gradient)?;
        input.set_melt_pool_width(p.melt_pool_width)?;
        input.set_melt_pool_depth(p.melt_pool_depth)?;
        if p.random_seed != DEFAULT_RANDOM_SEED {
            input.set_random_seed(p.random_seed)?;
        }
        Ok(input)
    }

    pub fn params(&self) -> &MicrostructureParams {
        &self.params
    }

    pub fn sample_min_x(&self) -> f64 {
        self.params.sample_min_x
    }

    pub fn set_sample_min_x(&mut self, value: f64) -> CoreResult<()> {
        self.params.sample_min_x = validate_range(
            value,
            MIN_POSITION_COORDINATE,
            MAX_POSITION_COORDINATE,
            "sample_min_x",
        )?;
        Ok(())
    }

    pub fn sample_min_y(&self) -> f64 {
        self.params.sample_min_y
    }

    pub fn set_sample_min_y(&mut self, value: f64) -> CoreResult<()> {
        self.params.sample_min_y = validate_range(
            value,
            MIN_POSITION_COORDINATE,
            MAX_POSITION_COORDINATE,
            "sample_min_y",
        )?;
        Ok(())
    }

    pub fn sample_min_z(&self) -> f64 {
        self.params.sample_min_z
    }

    pub fn set_sample_min_z(&mut self, value: f64) -> CoreResult<()> {
        self.params.sample_min_z = validate_range(
            value,
            MIN_POSITION_COORDINATE,
            MAX_POSITION_COORDINATE,
            "sample_min_z",
        )?;
        Ok(())
    }

    pub fn sample_size_x(&self) -> f64 {
        self.params.sample_size_x
    }

    pub fn set_sample_size_x(&mut self, value: f64) -> CoreResult<()> {
        validate_range(value, MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, "sample_size_x")?;
        self.params.sample_size_x = validate_size(
            value,
            self.params.sensor_dimension,
            MIN_XY_SIZE_CUSHION,
            "sample_size_x",
        )?;
        Ok(())
    }

    pub fn sample_size_y(&self) -> f64 {
        self.params.sample_size_y
    }

    pub fn set_sample_size_y(&mut self, value: f64) -> CoreResult<()> {
        validate_range(value, MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, "sample_size_y")?;
        self.params.sample_size_y = validate_size(
            value,
            self.params.sensor_dimension,
            MIN_XY_SIZE_CUSHION,
            "sample_size_y",
        )?;
        Ok(())
    }

    pub fn sample_size_z(&self) -> f64 {
        self.params.sample_size_z
    }

    pub fn set_sample_size_z(&mut self, value: f64) -> CoreResult<()> {
        validate_range(value, MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, "sample_size_z")?;
        self.params.sample_size_z = validate_size(
            value,
            self.params.sensor_dimension,
            MIN_Z_SIZE_CUSHION,
            "sample_size_z",
        )?;
        Ok(())
    }

    /// Edge length (m) of the cubic sensor region.
    pub fn sensor_dimension(&self) -> f64 {
        self.params.sensor_dimension
    }

    /// Every sample size that no longer fits is reported, one per line.
    pub fn set_sensor_dimension(&mut self, value: f64) -> CoreResult<()> {
        validate_range(
            value,
            MIN_SENSOR_DIMENSION,
            MAX_SENSOR_DIMENSION,
            "sensor_dimension",
        )?;
        let mut size_errors = String::new();
        for (size, cushion, name) in [
            (self.params.sample_size_x, MIN_XY_SIZE_CUSHION, "sample_size_x"),
            (self.params.sample_size_y, MIN_XY_SIZE_CUSHION, "sample_size_y"),
            (self.params.sample_size_z, MIN_Z_SIZE_CUSHION, "sample_size_z"),
        ] {
            if let Err(e) = validate_size(size, value, cushion, name) {
                size_errors.push_str(&e.to_string());
                size_errors.push('\n');
            }
        }
        if !size_errors.is_empty() {
            return Err(CoreError::validation(size_errors));
        }
        self.params.sensor_dimension = value;
        Ok(())
    }

    pub fn use_provided_thermal_parameters(&self) -> bool {
        self.params.use_provided_thermal_parameters
    }

    pub fn set_use_provided_thermal_parameters(&mut self, value: bool) {
        self.params.use_provided_thermal_parameters = value;
    }

    /// Material cooling rate (K/s). Used only with provided thermal parameters.
    pub fn cooling_rate(&self) -> f64 {
        self.params.cooling_rate
    }

    pub fn set_cooling_rate(&mut self, value: f64) -> CoreResult<()> {
        self.params.cooling_rate =
            validate_range(value, MIN_COOLING_RATE, MAX_COOLING_RATE, "cooling_rate")?;
        Ok(())
    }

    pub fn cooling_rate_quantity(&self) -> TemperatureRate {
        kps(self.params.cooling_rate)
    }

    /// Thermal gradient (K/m). Used only with provided thermal parameters.
    pub fn thermal_gradient(&self) -> f64 {
        self.params.thermal_gradient
    }

    pub fn thermal_gradient_quantity(&self) -> TemperatureGradient {
        kpm(self.params.thermal_gradient)
    }

    pub fn set_thermal_gradient(&mut self, value: f64) -> CoreResult<()> {
        self.params.thermal_gradient = validate_range(
            value,
            MIN_THERMAL_GRADIENT,
            MAX_THERMAL_GRADIENT,
            "thermal_gradient",
        )?;
        Ok(())
    }

    pub fn melt_pool_width(&self) -> f64 {
        self.params.melt_pool_width
    }

    pub fn set_melt_pool_width(&mut self, value: f64) -> CoreResult<()> {
        self.params.melt_pool_width = validate_range(
            value,
            MIN_MELT_POOL_WIDTH,
            MAX_MELT_POOL_WIDTH,
            "melt_pool_width",
        )?;
        Ok(())
    }

    pub fn melt_pool_depth(&self) -> f64 {
        self.params.melt_pool_depth
    }

    pub fn set_melt_pool_depth(&mut self, value: f64) -> CoreResult<()> {
        self.params.melt_pool_depth = validate_range(
            value,
            MIN_MELT_POOL_DEPTH,
            MAX_MELT_POOL_DEPTH,
            "melt_pool_depth",
        )?;
        Ok(())
    }

    /// Zero means no seed was set.
    pub fn random_seed(&self) -> u64 {
        self.params.random_seed
    }

    pub fn set_random_seed(&mut self, value: u64) -> CoreResult<()> {
        validate_range(
            value as f64,
            MIN_RANDOM_SEED as f64,
            MAX_RANDOM_SEED as f64,
            "random_seed",
        )?;
        self.params.random_seed = value;
        Ok(())
    }

    pub fn to_request(&self) -> SimulationRequest {
        let p = &self.params;
        SimulationRequest {
            id: self.id.clone(),
            input: RequestInput::Microstructure(MicrostructureInputMessage {
                machine: self.machine.to_message(),
                material: self.material.clone(),
                cube_min_x: p.sample_min_x,
                cube_min_y: p.sample_min_y,
                cube_min_z: p.sample_min_z,
                cube_size_x: p.sample_size_x,
                cube_size_y: p.sample_size_y,
                cube_size_z: p.sample_size_z,
                sensor_dimension: p.sensor_dimension,
                use_provided_thermal_parameters: p.use_provided_thermal_parameters,
                cooling_rate: p.cooling_rate,
                thermal_gradient: p.thermal_gradient,
                melt_pool_width: p.melt_pool_width,
                melt_pool_depth: p.melt_pool_depth,
                use_random_seed: p.random_seed != DEFAULT_RANDOM_SEED,
                random_seed: p.random_seed,
            }),
        }
    }
}

/// Circle equivalence statistics for one grain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleEquivalence {
    pub grain_number: u32,
    pub area_fraction: f64,
    /// Equivalent diameter (µm).
    pub diameter_um: f64,
    /// Radians on the wire, degrees once in a summary.
    pub orientation_angle: f64,
}

/// Microstructure results as returned by the service, one VTK file per plane.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureResult {
    pub xy_vtk: Vec<u8>,
    pub xz_vtk: Vec<u8>,
    pub yz_vtk: Vec<u8>,
    pub xy_circle_equivalence: Vec<CircleEquivalence>,
    pub xz_circle_equivalence: Vec<CircleEquivalence>,
    pub yz_circle_equivalence: Vec<CircleEquivalence>,
}

pub const XY_VTK_FILE: &str = "xy.vtk";
pub const XZ_VTK_FILE: &str = "xz.vtk";
pub const YZ_VTK_FILE: &str = "yz.vtk";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureSummary {
    pub input: MicrostructureInput,
    pub xy_vtk: PathBuf,
    pub xz_vtk: PathBuf,
    pub yz_vtk: PathBuf,
    pub xy_circle_equivalence: Vec<CircleEquivalence>,
    pub xz_circle_equivalence: Vec<CircleEquivalence>,
    pub yz_circle_equivalence: Vec<CircleEquivalence>,
    /// Area weighted grain diameter (µm) per plane.
    pub xy_average_grain_size: f64,
    pub xz_average_grain_size: f64,
    pub yz_average_grain_size: f64,
    pub logs: String,
    pub status: SimulationStatus,
}

impl MicrostructureSummary {
    /// `output_dir` is where the VTK files for this simulation live.
    pub fn new(
        input: MicrostructureInput,
        result: &MicrostructureResult,
        logs: String,
        output_dir: &Path,
        status: SimulationStatus,
    ) -> Self {
        let xy = to_degrees(&result.xy_circle_equivalence);
        let xz = to_degrees(&result.xz_circle_equivalence);
        let yz = to_degrees(&result.yz_circle_equivalence);
        Self {
            input,
            xy_vtk: output_dir.join(XY_VTK_FILE),
            xz_vtk: output_dir.join(XZ_VTK_FILE),
            yz_vtk: output_dir.join(YZ_VTK_FILE),
            xy_average_grain_size: average_grain_size(&xy),
            xz_average_grain_size: average_grain_size(&xz),
            yz_average_grain_size: average_grain_size(&yz),
            xy_circle_equivalence: xy,
            xz_circle_equivalence: xz,
            yz_circle_equivalence: yz,
            logs,
            status,
        }
    }
}

fn to_degrees(rows: &[CircleEquivalence]) -> Vec<CircleEquivalence> {
    rows.iter()
        .map(|r| CircleEquivalence {
            orientation_angle: radians_to_degrees(r.orientation_angle),
            ..*r
        })
        .collect()
}

pub fn average_grain_size(rows: &[CircleEquivalence]) -> f64 {
    rows.iter().map(|r| r.diameter_um * r.area_fraction).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(params: MicrostructureParams) -> CoreResult<MicrostructureInput> {
        MicrostructureInput::new(
            "micro_1",
            AdditiveMachine::default(),
            AdditiveMaterial::default(),
            params,
        )
    }

    #[test]
    fn defaults_are_valid() {
        let input = build(MicrostructureParams::default()).unwrap();
        assert_eq!(input.random_seed(), 0);
        assert_eq!(input.sensor_dimension(), DEFAULT_SENSOR_DIMENSION);
        assert_eq!(input.cooling_rate_quantity().value, DEFAULT_COOLING_RATE);
        assert_eq!(input.thermal_gradient_quantity().value, DEFAULT_THERMAL_GRADIENT);
    }

    #[test]
    fn sample_size_needs_cushion() {
        let err = build(MicrostructureParams {
            sample_size_z: 1.2e-3,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "sample_size_z must be at least 0.001 larger than sensor_dimension."
        );
    }

    #[test]
    fn sensor_dimension_reports_every_size() {
        let mut input = build(MicrostructureParams::default()).unwrap();
        // At the default 1.5 mm, x and y still clear a 1 mm sensor.
        input.set_sensor_dimension(1e-3).unwrap_err();
        input.set_sample_size_x(1.4e-3).unwrap();
        input.set_sample_size_y(1.4e-3).unwrap();
        let err = input.set_sensor_dimension(1e-3).unwrap_err().to_string();
        assert_eq!(err.lines().count(), 3);
        assert!(err.contains("sample_size_x"));
        assert!(err.contains("sample_size_y"));
        assert!(err.contains("sample_size_z"));
        assert_eq!(input.sensor_dimension(), DEFAULT_SENSOR_DIMENSION);
    }

    #[test]
    fn random_seed_range() {
        let mut input = build(MicrostructureParams::default()).unwrap();
        input.set_random_seed(MAX_RANDOM_SEED).unwrap();
        assert!(input.set_random_seed(0).is_err());
        assert!(input.set_random_seed(MAX_RANDOM_SEED + 1).is_err());
    }

    #[test]
    fn request_flags_seed_use() {
        let input = build(MicrostructureParams {
            random_seed: 42,
            ..Default::default()
        })
        .unwrap();
        match input.to_request().input {
            RequestInput::Microstructure(msg) => {
                assert!(msg.use_random_seed);
                assert_eq!(msg.random_seed, 42);
            }
            other => panic!("unexpected request input {other:?}"),
        }
    }

    #[test]
    fn summary_converts_angles_and_averages() {
        let grain = |n, af, d, a| CircleEquivalence {
            grain_number: n,
            area_fraction: af,
            diameter_um: d,
            orientation_angle: a,
        };
        let result = MicrostructureResult {
            xy_circle_equivalence: vec![
                grain(1, 0.25, 10.0, std::f64::consts::PI),
                grain(2, 0.75, 20.0, 0.0),
            ],
            ..Default::default()
        };
        let summary = MicrostructureSummary::new(
            build(MicrostructureParams::default()).unwrap(),
            &result,
            String::new(),
            Path::new("/tmp/out/micro_1"),
            SimulationStatus::Completed,
        );
        assert_eq!(summary.xy_average_grain_size, 17.5);
        assert_eq!(summary.xz_average_grain_size, 0.0);
        assert!((summary.xy_circle_equivalence[0].orientation_angle - 180.0).abs() < 1e-9);
        assert_eq!(summary.xy_vtk, Path::new("/tmp/out/micro_1/xy.vtk"));
    }
}
