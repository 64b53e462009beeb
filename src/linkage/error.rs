// src/linkage/error.rs - Typed failures raised by the record linkage engine
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkageError {
    #[error("Unknown matching profile '{0}' (expected one of: ZoomInfo, DNB, name)")]
    UnknownProfile(String),

    #[error("The {0} table has no index; set one before linking")]
    MissingIndex(&'static str),

    #[error("Invalid matching rules: {0}")]
    InvalidRules(#[from] serde_json::Error),

    #[error("Failed to start comparison workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type LinkageResult<T> = Result<T, LinkageError>;
