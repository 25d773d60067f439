use std::path::PathBuf;
use thiserror::Error;

pub type StudyResult<T> = Result<T, StudyError>;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("{} does not exist.", .0.display())]
    NotFound(PathBuf),

    #[error("{} does not have the expected columns.", .0.display())]
    MissingColumns(PathBuf),

    #[error("{} is not a valid file.", .0.display())]
    InvalidFile(PathBuf),

    #[error("{} is not a parametric study.", .0.display())]
    NotAStudy(PathBuf),

    #[error("Unsupported version, study version = {version}, latest supported version is {latest}.")]
    UnsupportedVersion { version: u32, latest: u32 },

    /// Rejected arguments, shown verbatim.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Core(String),

    #[error("{0}")]
    Client(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<am_core::CoreError> for StudyError {
    fn from(err: am_core::CoreError) -> Self {
        StudyError::Core(err.to_string())
    }
}

impl From<am_client::ClientError> for StudyError {
    fn from(err: am_client::ClientError) -> Self {
        StudyError::Client(err.to_string())
    }
}
