use std::fs;
use std::path::Path;

use qsim_core::{ModelConfig, RepetitionOutcome};
use serde::{Deserialize, Serialize};

use crate::stats::SampleSummary;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed reading file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed decoding json: {0}")]
    JsonDecode(#[source] serde_json::Error),

    #[error("failed encoding json: {0}")]
    JsonEncode(#[source] serde_json::Error),

    #[error("failed writing file: {0}")]
    Write(#[source] std::io::Error),

    #[error(transparent)]
    InvalidConfig(#[from] qsim_core::SimError),
}

/// An experiment's results as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub config: ModelConfig,
    pub base_seed: Option<u64>,
    pub outcomes: Vec<RepetitionOutcome>,
    pub summary: Option<SampleSummary>,
}

/// Read and validate a [`ModelConfig`].
pub fn read_config_from_path(path: impl AsRef<Path>) -> Result<ModelConfig, IoError> {
    let bytes = fs::read(path)?;
    let config: ModelConfig = serde_json::from_slice(&bytes).map_err(IoError::JsonDecode)?;
    config.validate()?;
    Ok(config)
}

pub fn write_config_to_path(path: impl AsRef<Path>, config: &ModelConfig) -> Result<(), IoError> {
    let bytes = serde_json::to_vec_pretty(config).map_err(IoError::JsonEncode)?;
    fs::write(path, bytes).map_err(IoError::Write)
}

pub fn write_outcomes_to_path(path: impl AsRef<Path>, results: &ResultsFile) -> Result<(), IoError> {
    let bytes = serde_json::to_vec_pretty(results).map_err(IoError::JsonEncode)?;
    fs::write(path, bytes).map_err(IoError::Write)
}

pub fn read_outcomes_from_path(path: impl AsRef<Path>) -> Result<ResultsFile, IoError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(IoError::JsonDecode)
}
