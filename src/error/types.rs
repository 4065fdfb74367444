//! Library error types

use thiserror::Error;

/// Errors produced by configuration loading, validation, and deployment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid project name {name:?}: {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("invalid env name {name:?}: {reason}")]
    InvalidEnvName { name: String, reason: String },

    #[error("config data has no `*.project_name` entry in its shared section")]
    MissingProjectName,

    #[error("unknown env {0:?}")]
    UnknownEnv(String),

    #[error("config data does not match the env schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("invalid S3 URI {0:?}")]
    InvalidS3Uri(String),

    #[error("bucket {0:?} versioning is suspended; enable or fully disable versioning")]
    S3BucketVersionSuspended(String),

    #[error("S3 object {0} does not exist")]
    S3ObjectNotExist(String),

    #[error("SSM parameter {0:?} does not exist")]
    ParameterNotFound(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("SSM error: {0}")]
    Ssm(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
