//! Typed multi-environment application configuration on AWS
//!
//! Config documents pair non-secret and secret JSON keyed by env name,
//! with shared-value inheritance across environments. Config sets
//! materialize typed per-env views and deploy payloads to SSM Parameter
//! Store with versioned S3 backups.

// Public modules
pub mod config;
pub mod constants;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod model;
pub mod naming;
pub mod release_history;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use deploy::{Deployment, DeploymentResult};
pub use error::ConfigError;
pub use model::{ConfigSet, Env, EnvCore, EnvName, GenericEnv};
pub use store::{Parameter, PutOptions, S3Parameter, S3Uri};
