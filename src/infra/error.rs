use std::path::PathBuf;

use thiserror::Error;

use crate::{domain::address::AddressError, engine::local::EngineStartError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to initialize logging: {0}")]
    LoggingInit(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("failed to open log file at {path}: {details}")]
    LogFileOpen { path: PathBuf, details: String },
    #[error("failed to resolve storage paths: {details}")]
    StoragePathResolution { details: String },
    #[error("invalid local identity `{address}`: {source}")]
    InvalidIdentity {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to start messaging engine: {0}")]
    EngineStart(#[from] EngineStartError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
