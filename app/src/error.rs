//! FILENAME: app/src/error.rs

use persistence::PersistenceError;
use rollup_engine::RollupError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Rollup(#[from] RollupError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
