//! Stored output data types.

use am_core::{SimulationError, SimulationStatus, SimulationSummary, SimulationType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type SimId = String;

/// Written as `manifest.json` next to a simulation's other outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputManifest {
    pub sim_id: SimId,
    pub sim_type: SimulationType,
    pub status: SimulationStatus,
    pub timestamp: String,
    pub input_hash: String,
    /// Scalar results keyed by metric name, e.g. `median_width`.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl OutputManifest {
    pub fn from_summary(summary: &SimulationSummary, input_hash: String) -> Self {
        let mut metrics = BTreeMap::new();
        match summary {
            SimulationSummary::SingleBead(s) => {
                let mp = &s.melt_pool;
                metrics.insert("median_width".to_string(), mp.median_width());
                metrics.insert("median_depth".to_string(), mp.median_depth());
                metrics.insert("median_length".to_string(), mp.median_length());
                metrics.insert(
                    "median_reference_width".to_string(),
                    mp.median_reference_width(),
                );
                metrics.insert(
                    "median_reference_depth".to_string(),
                    mp.median_reference_depth(),
                );
            }
            SimulationSummary::Porosity(s) => {
                metrics.insert("relative_density".to_string(), s.relative_density);
            }
            SimulationSummary::Microstructure(s) => {
                metrics.insert("xy_average_grain_size".to_string(), s.xy_average_grain_size);
                metrics.insert("xz_average_grain_size".to_string(), s.xz_average_grain_size);
                metrics.insert("yz_average_grain_size".to_string(), s.yz_average_grain_size);
            }
            SimulationSummary::ThermalHistory(_) => {}
        }
        // NaN does not survive JSON
        metrics.retain(|_, v| v.is_finite());

        Self {
            sim_id: summary.id().to_string(),
            sim_type: summary.sim_type(),
            status: summary.status(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            input_hash,
            metrics,
            error_message: None,
        }
    }

    pub fn from_error(error: &SimulationError, input_hash: String) -> Self {
        Self {
            sim_id: error.input.id().to_string(),
            sim_type: error.input.sim_type(),
            status: SimulationStatus::Error,
            timestamp: chrono::Utc::now().to_rfc3339(),
            input_hash,
            metrics: BTreeMap::new(),
            error_message: Some(error.message.clone()),
        }
    }
}
