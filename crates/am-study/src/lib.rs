//! am-study: parametric studies over additive simulations.
//!
//! Contains:
//! - columns (table schema and defaults)
//! - row (typed study rows, cell conversion, input building)
//! - permutations (sweep options and YAML/JSON plans)
//! - dedupe (duplicate simulation removal)
//! - csv_io (CSV import and export)
//! - migrate (study file schema and format migration)
//! - study (the study table and its operations)
//! - runner (running pending simulations)
//! - progress_handler (live status updates into a shared study)
//! - utils (build rate and energy density)

pub mod columns;
pub mod csv_io;
pub mod dedupe;
pub mod error;
pub mod migrate;
pub mod permutations;
pub mod progress_handler;
pub mod row;
pub mod runner;
pub mod study;
pub mod utils;

pub use columns::{Column, DEFAULT_ITERATION, DEFAULT_PRIORITY, FORMAT_VERSION, column_names};
pub use csv_io::RawRow;
pub use error::{StudyError, StudyResult};
pub use permutations::{
    HatchSweep, MicrostructurePermutations, PermutationPlan, PorosityPermutations,
    SingleBeadPermutations,
};
pub use progress_handler::ParametricStudyProgressHandler;
pub use row::{Cell, STUDY_TYPES, StudyRow};
pub use runner::{ParametricRunner, RunFilter};
pub use study::{ParametricStudy, STUDY_EXTENSION};
pub use utils::{build_rate, energy_density};
