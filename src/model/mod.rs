//! Domain model: env documents, inheritance, and typed config sets

pub mod config_set;
pub mod env;
pub mod inheritance;

pub use config_set::ConfigSet;
pub use env::{Env, EnvCore, EnvName, GenericEnv};
pub use inheritance::{apply_shared_values, deep_merge};
