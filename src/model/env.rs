//! Typed per-environment configuration
//!
//! Callers define their env struct with the fields their application needs,
//! flatten [`EnvCore`] into it, and get the derived naming/location helpers
//! from the [`Env`] trait for free.

use crate::constants::EnvVarName;
use crate::error::ConfigError;
use crate::naming::normalize_parameter_name;
use crate::store::S3Uri;
use crate::utils::slugify;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Env name of devops resources shared across workload environments.
const DEVOPS_ENV_NAME: &str = "devops";

/// The fields every environment carries.
///
/// Flatten this into your env struct:
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct MyEnv {
///     #[serde(flatten)]
///     core: EnvCore,
///     username: String,
///     password: String,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvCore {
    pub project_name: String,
    pub env_name: String,
    pub s3uri_data: String,
    pub s3uri_artifacts: String,
}

/// A typed environment configuration.
///
/// Only `core` must be implemented; everything else is derived naming and
/// locations shared by all environments.
pub trait Env: Serialize + DeserializeOwned {
    fn core(&self) -> &EnvCore;

    fn project_name(&self) -> &str {
        &self.core().project_name
    }

    fn env_name(&self) -> &str {
        &self.core().env_name
    }

    fn project_name_snake(&self) -> String {
        slugify(self.project_name(), "_")
    }

    fn project_name_slug(&self) -> String {
        slugify(self.project_name(), "-")
    }

    /// `{project_name_snake}-{env_name}`, the base of most resource names.
    fn prefix_name_snake(&self) -> String {
        format!("{}-{}", self.project_name_snake(), self.env_name())
    }

    fn prefix_name_slug(&self) -> String {
        format!("{}-{}", self.project_name_slug(), self.env_name())
    }

    /// SSM Parameter Store name for this environment's configuration.
    fn parameter_name(&self) -> String {
        normalize_parameter_name(&self.prefix_name_snake())
    }

    /// Root of this environment's data files.
    fn s3dir_env_data(&self) -> Result<S3Uri, ConfigError> {
        Ok(S3Uri::parse(&self.core().s3uri_data)?.into_dir())
    }

    /// Root of this environment's build/deployment artifacts.
    fn s3dir_env_artifacts(&self) -> Result<S3Uri, ConfigError> {
        Ok(S3Uri::parse(&self.core().s3uri_artifacts)?.into_dir())
    }

    /// Scratch space under the artifacts root.
    fn s3dir_tmp_artifacts(&self) -> Result<S3Uri, ConfigError> {
        Ok(self.s3dir_env_artifacts()?.join("tmp/"))
    }

    /// Config snapshots under the artifacts root.
    fn s3dir_config_artifacts(&self) -> Result<S3Uri, ConfigError> {
        Ok(self.s3dir_env_artifacts()?.join("config/"))
    }

    /// Process environment variables this env exports for its workloads.
    fn env_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                EnvVarName::ProjectName.to_string(),
                self.project_name().to_string(),
            ),
            (EnvVarName::EnvName.to_string(), self.env_name().to_string()),
            (
                EnvVarName::ParameterName.to_string(),
                self.parameter_name(),
            ),
        ])
    }

    /// Tags for devops resources shared across workload environments.
    fn devops_aws_tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                crate::constants::AwsTagKey::ProjectName.to_string(),
                self.project_name().to_string(),
            ),
            (
                crate::constants::AwsTagKey::EnvName.to_string(),
                DEVOPS_ENV_NAME.to_string(),
            ),
        ])
    }

    /// Tags for resources belonging to this specific environment.
    fn workload_aws_tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                crate::constants::AwsTagKey::ProjectName.to_string(),
                self.project_name().to_string(),
            ),
            (
                crate::constants::AwsTagKey::EnvName.to_string(),
                self.env_name().to_string(),
            ),
        ])
    }

    /// CloudFormation stack name. Slug form; stack names reject underscores.
    fn cloudformation_stack_name(&self) -> String {
        self.prefix_name_slug()
    }
}

/// An untyped environment carrying the core fields plus whatever else the
/// config document holds. Used by admin tooling that deploys or inspects
/// configs without knowing the application schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEnv {
    #[serde(flatten)]
    pub core: EnvCore,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Env for GenericEnv {
    fn core(&self) -> &EnvCore {
        &self.core
    }
}

/// Caller-defined environment-name enums.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum EnvName { Dev, Prod }
/// ```
pub trait EnvName: Copy + Eq + fmt::Display + FromStr + Sized + 'static {
    fn as_str(&self) -> &'static str;

    /// Every defined environment, in deployment order.
    fn all() -> Vec<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Server {
        #[serde(default)]
        ip: Option<String>,
        #[serde(default)]
        cpu: Option<u32>,
        #[serde(default)]
        memory: Option<u32>,
        #[serde(default)]
        domain: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Servers {
        #[serde(default)]
        blue: Option<Server>,
        #[serde(default)]
        green: Option<Server>,
        #[serde(default)]
        black: Option<Server>,
        #[serde(default)]
        white: Option<Server>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Database {
        #[serde(default)]
        host: Option<String>,
        #[serde(default)]
        port: Option<u16>,
        #[serde(default)]
        password: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SampleEnv {
        #[serde(flatten)]
        core: EnvCore,
        username: Option<String>,
        password: Option<String>,
        #[serde(default)]
        servers: Option<Servers>,
        #[serde(default)]
        databases: Vec<Database>,
    }

    impl Env for SampleEnv {
        fn core(&self) -> &EnvCore {
            &self.core
        }
    }

    fn sample_data() -> serde_json::Value {
        json!({
            "project_name": "my_app",
            "env_name": "dev",
            "s3uri_data": "s3://myapp-dev/data/",
            "s3uri_artifacts": "s3://myapp-dev/artifacts/",
            "username": "alice@email.com",
            "password": "alicepassword",
            "servers": {
                "blue": {
                    "ip": "111.111.111.111",
                    "cpu": 4,
                    "memory": 16,
                    "domain": "blue.myapp.com",
                },
                "green": {"ip": "222.222.222.222"},
            },
            "databases": [
                {"host": "db1.myapp.com", "port": 5432, "password": "db1password"},
                {"host": "db2.myapp.com", "port": 3306, "password": "db2password"},
            ],
        })
    }

    #[test]
    fn test_typed_env_from_value() {
        let env: SampleEnv = serde_json::from_value(sample_data()).unwrap();
        assert_eq!(env.project_name(), "my_app");
        assert_eq!(env.env_name(), "dev");
        let servers = env.servers.as_ref().unwrap();
        assert!(servers.blue.is_some());
        assert!(servers.black.is_none());
        assert_eq!(env.databases[0].port, Some(5432));
    }

    #[test]
    fn test_derived_names() {
        let env: SampleEnv = serde_json::from_value(sample_data()).unwrap();
        assert_eq!(env.project_name_snake(), "my_app");
        assert_eq!(env.project_name_slug(), "my-app");
        assert_eq!(env.prefix_name_snake(), "my_app-dev");
        assert_eq!(env.prefix_name_slug(), "my-app-dev");
        assert_eq!(env.parameter_name(), "my_app-dev");
        assert_eq!(env.cloudformation_stack_name(), "my-app-dev");
    }

    #[test]
    fn test_s3_locations() {
        let env: SampleEnv = serde_json::from_value(sample_data()).unwrap();
        assert_eq!(env.s3dir_env_data().unwrap().uri(), "s3://myapp-dev/data/");
        assert_eq!(
            env.s3dir_tmp_artifacts().unwrap().uri(),
            "s3://myapp-dev/artifacts/tmp/"
        );
        assert_eq!(
            env.s3dir_config_artifacts().unwrap().uri(),
            "s3://myapp-dev/artifacts/config/"
        );
    }

    #[test]
    fn test_env_vars_and_tags() {
        let env: SampleEnv = serde_json::from_value(sample_data()).unwrap();
        let vars = env.env_vars();
        assert_eq!(vars["PROJECT_NAME"], "my_app");
        assert_eq!(vars["ENV_NAME"], "dev");
        assert_eq!(vars["PARAMETER_NAME"], "my_app-dev");

        assert_eq!(env.devops_aws_tags()["env_name"], "devops");
        assert_eq!(env.workload_aws_tags()["env_name"], "dev");
        assert_eq!(env.workload_aws_tags()["project_name"], "my_app");
    }

    #[test]
    fn test_round_trip() {
        let env: SampleEnv = serde_json::from_value(sample_data()).unwrap();
        let value = serde_json::to_value(&env).unwrap();
        let back: SampleEnv = serde_json::from_value(value).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn test_generic_env_keeps_extra_fields() {
        let env: GenericEnv = serde_json::from_value(sample_data()).unwrap();
        assert_eq!(env.core.project_name, "my_app");
        assert_eq!(env.extra["username"], "alice@email.com");
        assert_eq!(env.parameter_name(), "my_app-dev");
    }
}
