//! am-results: per-simulation output storage and input hashing.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_input_hash;
pub use store::OutputStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output not found: {sim_id}")]
    OutputNotFound { sim_id: String },

    #[error("Invalid simulation id: {sim_id:?}")]
    InvalidId { sim_id: String },
}
