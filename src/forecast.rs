//! Temperature forecasting with a pretrained gradient-boosted tree ensemble.
//!
//! The model artifact is produced offline; this module only loads it and runs
//! inference. [`Forecaster`] owns the loaded model for the lifetime of the
//! service and swaps it when the artifact on disk changes.

mod forecaster;
mod model;

use std::io;

use thiserror::Error;

pub use forecaster::*;
pub use model::*;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("failed to read model artifact")]
    Io(#[from] io::Error),

    #[error("failed to parse model artifact")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("not enough history: model needs {required} points, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("cannot forecast from an empty series")]
    EmptySeries,

    #[error("model loading task failed")]
    Join(#[from] tokio::task::JoinError),
}

pub type ForecastResult<T> = Result<T, ForecastError>;
