//! Tuning a user defined material so simulations match experimental melt
//! pools.

use crate::ids::new_sim_id;
use crate::request::{MaterialTuningInputMessage, RequestInput, SimulationRequest};
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest accepted relative error between experiment and simulation.
pub const DEFAULT_ALLOWABLE_ERROR: f64 = 0.05;
pub const DEFAULT_MAX_ITERATIONS: u32 = 15;
/// Base plate temperature (K) used when the characteristic width is computed.
pub const DEFAULT_BASE_PLATE_TEMPERATURE: f64 = 353.15;

pub const OPTIMIZED_PARAMETERS_FILE: &str = "optimized_parameters.csv";
pub const COEFFICIENTS_FILE: &str = "coefficients.csv";
pub const MATERIAL_CONFIGURATION_FILE: &str = "material_configuration.json";
pub const CHARACTERISTIC_WIDTH_FILE: &str = "characteristic_width_lookup.csv";
pub const TUNING_LOG_FILE: &str = "log.txt";

fn existing(path: &Path) -> CoreResult<PathBuf> {
    if !path.is_file() {
        return Err(CoreError::validation(format!(
            "File not found: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialTuningInput {
    pub id: String,
    experiment_data_file: PathBuf,
    material_configuration_file: PathBuf,
    thermal_properties_lookup_file: PathBuf,
    characteristic_width_lookup_file: Option<PathBuf>,
    pub allowable_error: f64,
    pub max_iterations: u32,
    /// Only used when no characteristic width lookup file is given.
    pub base_plate_temperature: f64,
}

impl MaterialTuningInput {
    /// `experiment_data_file` and `thermal_properties_lookup_file` are CSV,
    /// `material_configuration_file` is the material parameter JSON.
    pub fn new(
        id: impl Into<String>,
        experiment_data_file: impl AsRef<Path>,
        material_configuration_file: impl AsRef<Path>,
        thermal_properties_lookup_file: impl AsRef<Path>,
    ) -> CoreResult<Self> {
        let id = id.into();
        Ok(Self {
            id: if id.is_empty() { new_sim_id() } else { id },
            experiment_data_file: existing(experiment_data_file.as_ref())?,
            material_configuration_file: existing(material_configuration_file.as_ref())?,
            thermal_properties_lookup_file: existing(thermal_properties_lookup_file.as_ref())?,
            characteristic_width_lookup_file: None,
            allowable_error: DEFAULT_ALLOWABLE_ERROR,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            base_plate_temperature: DEFAULT_BASE_PLATE_TEMPERATURE,
        })
    }

    pub fn with_characteristic_width_lookup(mut self, path: impl AsRef<Path>) -> CoreResult<Self> {
        self.characteristic_width_lookup_file = Some(existing(path.as_ref())?);
        Ok(self)
    }

    pub fn experiment_data_file(&self) -> &Path {
        &self.experiment_data_file
    }

    pub fn material_configuration_file(&self) -> &Path {
        &self.material_configuration_file
    }

    pub fn thermal_properties_lookup_file(&self) -> &Path {
        &self.thermal_properties_lookup_file
    }

    pub fn characteristic_width_lookup_file(&self) -> Option<&Path> {
        self.characteristic_width_lookup_file.as_deref()
    }

    /// Read the input files into a request.
    pub fn to_request(&self) -> CoreResult<SimulationRequest> {
        let characteristic_width_lookup = match &self.characteristic_width_lookup_file {
            Some(path) => fs::read(path)?,
            None => Vec::new(),
        };
        Ok(SimulationRequest {
            id: self.id.clone(),
            input: RequestInput::MaterialTuning(MaterialTuningInputMessage {
                experiment_data: fs::read(&self.experiment_data_file)?,
                material_parameters: fs::read(&self.material_configuration_file)?,
                thermal_properties_lookup: fs::read(&self.thermal_properties_lookup_file)?,
                characteristic_width_lookup,
                allowable_error: self.allowable_error,
                max_iterations: self.max_iterations,
                base_plate_temperature: self.base_plate_temperature,
            }),
        })
    }
}

/// Files produced by a tuning run. Only the optimized parameters are always
/// present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTuningResult {
    pub optimized_parameters: Vec<u8>,
    pub coefficients: Vec<u8>,
    pub material_parameters: Vec<u8>,
    pub characteristic_width_lookup: Vec<u8>,
    pub log: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialTuningSummary {
    pub input: MaterialTuningInput,
    pub optimized_parameters_file: PathBuf,
    pub coefficients_file: Option<PathBuf>,
    /// Material parameters with updated penetration depth and absorptivity.
    pub material_configuration_file: Option<PathBuf>,
    /// The computed lookup, or the one given in the input.
    pub characteristic_width_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl MaterialTuningSummary {
    /// Write the result files into `out_dir`, creating it if needed.
    pub fn new(
        input: MaterialTuningInput,
        result: &MaterialTuningResult,
        out_dir: &Path,
    ) -> CoreResult<Self> {
        fs::create_dir_all(out_dir)?;
        let write = |name: &str, content: &[u8]| -> CoreResult<Option<PathBuf>> {
            if content.is_empty() {
                return Ok(None);
            }
            let path = out_dir.join(name);
            fs::write(&path, content)?;
            Ok(Some(path))
        };

        let optimized_parameters_file = out_dir.join(OPTIMIZED_PARAMETERS_FILE);
        fs::write(&optimized_parameters_file, &result.optimized_parameters)?;
        let coefficients_file = write(COEFFICIENTS_FILE, &result.coefficients)?;
        let material_configuration_file =
            write(MATERIAL_CONFIGURATION_FILE, &result.material_parameters)?;
        let characteristic_width_file =
            match write(CHARACTERISTIC_WIDTH_FILE, &result.characteristic_width_lookup)? {
                Some(path) => Some(path),
                None => input.characteristic_width_lookup_file.clone(),
            };
        let log_file = write(TUNING_LOG_FILE, &result.log)?;
        debug!(id = %input.id, dir = %out_dir.display(), "Wrote material tuning results");

        Ok(Self {
            input,
            optimized_parameters_file,
            coefficients_file,
            material_configuration_file,
            characteristic_width_file,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("am_core_tuning_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn input(dir: &Path) -> MaterialTuningInput {
        fs::write(dir.join("experiment.csv"), "power,speed,width\n200,1,1e-4\n").unwrap();
        fs::write(dir.join("material.json"), r#"{"name": "custom"}"#).unwrap();
        fs::write(dir.join("thermal.csv"), "T,k\n300,10\n").unwrap();
        MaterialTuningInput::new(
            "tune_1",
            dir.join("experiment.csv"),
            dir.join("material.json"),
            dir.join("thermal.csv"),
        )
        .unwrap()
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = scratch("missing");
        let err = MaterialTuningInput::new(
            "",
            dir.join("experiment.csv"),
            dir.join("material.json"),
            dir.join("thermal.csv"),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("File not found: "));
        assert!(err.to_string().ends_with("experiment.csv"));

        let err = input(&dir)
            .with_characteristic_width_lookup(dir.join("cw.csv"))
            .unwrap_err();
        assert!(err.to_string().ends_with("cw.csv"));
    }

    #[test]
    fn request_carries_file_contents() {
        let dir = scratch("request");
        let input = input(&dir);
        assert_eq!(input.max_iterations, DEFAULT_MAX_ITERATIONS);
        let request = input.to_request().unwrap();
        assert_eq!(request.id, "tune_1");
        let RequestInput::MaterialTuning(msg) = request.input else {
            panic!("expected a material tuning request");
        };
        assert_eq!(msg.material_parameters, br#"{"name": "custom"}"#.to_vec());
        assert!(msg.characteristic_width_lookup.is_empty());
        assert_eq!(msg.base_plate_temperature, DEFAULT_BASE_PLATE_TEMPERATURE);
    }

    #[test]
    fn summary_writes_present_files_only() {
        let dir = scratch("summary");
        fs::write(dir.join("cw.csv"), "T,w\n300,1e-4\n").unwrap();
        let input = input(&dir)
            .with_characteristic_width_lookup(dir.join("cw.csv"))
            .unwrap();
        let result = MaterialTuningResult {
            optimized_parameters: b"a,b\n1,2\n".to_vec(),
            log: b"converged".to_vec(),
            ..Default::default()
        };
        let out = dir.join("out");
        let summary = MaterialTuningSummary::new(input, &result, &out).unwrap();
        assert_eq!(
            fs::read_to_string(&summary.optimized_parameters_file).unwrap(),
            "a,b\n1,2\n"
        );
        assert_eq!(summary.log_file, Some(out.join(TUNING_LOG_FILE)));
        assert!(summary.coefficients_file.is_none());
        assert!(summary.material_configuration_file.is_none());
        // No computed lookup, so the input one is reported.
        assert_eq!(summary.characteristic_width_file, Some(dir.join("cw.csv")));
        assert!(!out.join(CHARACTERISTIC_WIDTH_FILE).exists());
    }
}
