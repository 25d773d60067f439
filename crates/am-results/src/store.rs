//! Output storage API.
//!
//! Layout under the user data directory:
//!
//! ```text
//! <root>/<sim id>/manifest.json
//! <root>/<sim id>/melt_pool.jsonl
//! <root>/<sim id>/logs.txt
//! <root>/<sim id>/xy.vtk, xz.vtk, yz.vtk
//! <root>/<sim id>/thermal_history/gridfullthermal.zip
//! <root>/<sim id>/coax_ave_output/coax_ave_output.zip
//! ```

use crate::hash::compute_input_hash;
use crate::types::OutputManifest;
use crate::{ResultsError, ResultsResult};
use am_core::microstructure::{MicrostructureResult, XY_VTK_FILE, XZ_VTK_FILE, YZ_VTK_FILE};
use am_core::single_bead::THERMAL_HISTORY_OUTPUT_ZIP;
use am_core::thermal_history::{COAX_AVE_OUTPUT_DIR, COAX_AVE_OUTPUT_ZIP};
use am_core::{MeltPoolTimeStep, SimulationError, SimulationSummary, SimulationType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MANIFEST_FILE: &str = "manifest.json";
const MELT_POOL_FILE: &str = "melt_pool.jsonl";
const LOGS_FILE: &str = "logs.txt";
pub const THERMAL_HISTORY_DIR: &str = "thermal_history";

#[derive(Clone, Debug)]
pub struct OutputStore {
    root_dir: PathBuf,
}

impl OutputStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Directory for one simulation's outputs. Does not create it.
    pub fn output_dir(&self, sim_id: &str) -> ResultsResult<PathBuf> {
        if sim_id.is_empty()
            || sim_id == "."
            || sim_id == ".."
            || sim_id.contains(['/', '\\'])
        {
            return Err(ResultsError::InvalidId {
                sim_id: sim_id.to_string(),
            });
        }
        Ok(self.root_dir.join(sim_id))
    }

    fn ensure_output_dir(&self, sim_id: &str) -> ResultsResult<PathBuf> {
        let dir = self.output_dir(sim_id)?;
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn has_output(&self, sim_id: &str) -> bool {
        self.output_dir(sim_id)
            .map(|dir| dir.join(MANIFEST_FILE).exists())
            .unwrap_or(false)
    }

    /// Write the three plane VTK files and return the directory holding them.
    pub fn write_microstructure_vtk(
        &self,
        sim_id: &str,
        result: &MicrostructureResult,
    ) -> ResultsResult<PathBuf> {
        let dir = self.ensure_output_dir(sim_id)?;
        fs::write(dir.join(XY_VTK_FILE), &result.xy_vtk)?;
        fs::write(dir.join(XZ_VTK_FILE), &result.xz_vtk)?;
        fs::write(dir.join(YZ_VTK_FILE), &result.yz_vtk)?;
        debug!(sim_id, dir = %dir.display(), "Wrote microstructure VTK files");
        Ok(dir)
    }

    /// Store the single bead thermal history archive and return its directory.
    pub fn write_thermal_history(&self, sim_id: &str, archive: &[u8]) -> ResultsResult<PathBuf> {
        self.write_archive(sim_id, THERMAL_HISTORY_DIR, THERMAL_HISTORY_OUTPUT_ZIP, archive)
    }

    /// Store the coaxial average sensor archive of a thermal history
    /// simulation and return its directory.
    pub fn write_coax_ave_output(&self, sim_id: &str, archive: &[u8]) -> ResultsResult<PathBuf> {
        self.write_archive(sim_id, COAX_AVE_OUTPUT_DIR, COAX_AVE_OUTPUT_ZIP, archive)
    }

    fn write_archive(
        &self,
        sim_id: &str,
        dir_name: &str,
        file_name: &str,
        archive: &[u8],
    ) -> ResultsResult<PathBuf> {
        let dir = self.ensure_output_dir(sim_id)?.join(dir_name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file_name), archive)?;
        debug!(sim_id, file = %dir.join(file_name).display(), "Stored archive");
        Ok(dir)
    }

    pub fn save_logs(&self, sim_id: &str, logs: &str) -> ResultsResult<()> {
        if logs.is_empty() {
            return Ok(());
        }
        let dir = self.ensure_output_dir(sim_id)?;
        fs::write(dir.join(LOGS_FILE), logs)?;
        Ok(())
    }

    pub fn load_logs(&self, sim_id: &str) -> ResultsResult<String> {
        let path = self.output_dir(sim_id)?.join(LOGS_FILE);
        if !path.exists() {
            return Ok(String::new());
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Persist the manifest, logs and, for single bead runs, the melt pool series.
    pub fn save_summary(&self, summary: &SimulationSummary) -> ResultsResult<OutputManifest> {
        let sim_id = summary.id();
        let dir = self.ensure_output_dir(sim_id)?;

        let input_hash = compute_input_hash(&summary.input());
        let manifest = OutputManifest::from_summary(summary, input_hash);
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;

        if let SimulationSummary::SingleBead(s) = summary {
            let mut content = String::new();
            for step in s.melt_pool.time_steps() {
                content.push_str(&serde_json::to_string(step)?);
                content.push('\n');
            }
            fs::write(dir.join(MELT_POOL_FILE), content)?;
        }

        self.save_logs(sim_id, summary.logs())?;
        Ok(manifest)
    }

    pub fn save_error(&self, error: &SimulationError) -> ResultsResult<OutputManifest> {
        let sim_id = error.input.id();
        let dir = self.ensure_output_dir(sim_id)?;
        let manifest = OutputManifest::from_error(error, compute_input_hash(&error.input));
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        self.save_logs(sim_id, &error.logs)?;
        Ok(manifest)
    }

    pub fn load_manifest(&self, sim_id: &str) -> ResultsResult<OutputManifest> {
        let path = self.output_dir(sim_id)?.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(ResultsError::OutputNotFound {
                sim_id: sim_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_melt_pool(&self, sim_id: &str) -> ResultsResult<Vec<MeltPoolTimeStep>> {
        let path = self.output_dir(sim_id)?.join(MELT_POOL_FILE);
        if !path.exists() {
            return Err(ResultsError::OutputNotFound {
                sim_id: sim_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        let mut steps = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                steps.push(serde_json::from_str(line)?);
            }
        }
        Ok(steps)
    }

    /// Manifests of stored outputs, optionally only those of one type.
    pub fn list_outputs(
        &self,
        sim_type: Option<SimulationType>,
    ) -> ResultsResult<Vec<OutputManifest>> {
        let mut outputs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(outputs);
        }
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let sim_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&sim_id)
                    && sim_type.is_none_or(|t| manifest.sim_type == t)
                {
                    outputs.push(manifest);
                }
            }
        }
        outputs.sort_by(|a, b| a.sim_id.cmp(&b.sim_id));
        Ok(outputs)
    }

    pub fn delete_output(&self, sim_id: &str) -> ResultsResult<()> {
        let dir = self.output_dir(sim_id)?;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
