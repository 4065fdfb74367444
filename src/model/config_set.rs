//! Multi-environment config sets
//!
//! A [`ConfigSet`] owns the non-secret and secret documents for every
//! environment of one project, resolves shared-value inheritance at
//! construction time, and hands out typed per-env views. It also drives
//! deployment of per-env (or consolidated) payloads to AWS.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_ssm::Client as SsmClient;
use serde_json::{json, Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use crate::constants::{ALL_ENVS, DATA, SECRET_DATA, SHARED};
use crate::deploy::{Deployment, DeploymentResult};
use crate::error::ConfigError;
use crate::model::env::Env;
use crate::model::inheritance::{apply_shared_values, deep_merge_maps};
use crate::naming::{normalize_parameter_name, validate_env_name, validate_project_name};
use crate::store::ssm::{get_parameter, PutOptions};
use crate::store::S3Uri;
use crate::utils::slugify;

const PROJECT_NAME_SHARED_KEY: &str = "*.project_name";

/// The configs of one project across all of its environments.
pub struct ConfigSet<E> {
    data: Map<String, Value>,
    secret_data: Map<String, Value>,
    version: String,
    project_name: String,
    merged: Map<String, Value>,
    _env: PhantomData<fn() -> E>,
}

impl<E> Clone for ConfigSet<E> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            secret_data: self.secret_data.clone(),
            version: self.version.clone(),
            project_name: self.project_name.clone(),
            merged: self.merged.clone(),
            _env: PhantomData,
        }
    }
}

impl<E: Env> fmt::Debug for ConfigSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSet")
            .field("project_name", &self.project_name)
            .field("version", &self.version)
            .field("envs", &self.env_names())
            .field("secret_data", &"<redacted>")
            .finish()
    }
}

impl<E: Env> ConfigSet<E> {
    /// Build a config set from in-memory documents.
    ///
    /// Validates the project name and every env name, applies shared-value
    /// inheritance to both documents, and merges secrets over data.
    pub fn from_values(
        data: Map<String, Value>,
        secret_data: Map<String, Value>,
        version: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let project_name = data
            .get(SHARED)
            .and_then(|shared| shared.get(PROJECT_NAME_SHARED_KEY))
            .and_then(Value::as_str)
            .ok_or(ConfigError::MissingProjectName)?
            .to_string();
        validate_project_name(&project_name)?;
        for env_name in data.keys().chain(secret_data.keys()) {
            if env_name != SHARED {
                validate_env_name(env_name)?;
            }
        }

        let mut applied_data = data.clone();
        apply_shared_values(&mut applied_data);
        let mut applied_secret_data = secret_data.clone();
        apply_shared_values(&mut applied_secret_data);
        let merged = deep_merge_maps(&applied_data, &applied_secret_data);

        Ok(Self {
            data,
            secret_data,
            version: version.into(),
            project_name,
            merged,
            _env: PhantomData,
        })
    }

    /// Build a config set from a deployed payload `{"data":…, "secret_data":…}`.
    pub fn from_payload(payload: &Value, version: impl Into<String>) -> Result<Self, ConfigError> {
        let section = |key: &str| -> Result<Map<String, Value>, ConfigError> {
            match payload.get(key) {
                Some(Value::Object(map)) => Ok(map.clone()),
                Some(_) | None => Err(ConfigError::Internal(anyhow::anyhow!(
                    "config payload has no {key:?} object"
                ))),
            }
        };
        Self::from_values(section(DATA)?, section(SECRET_DATA)?, version)
    }

    /// Load from two local JSON files (non-secret and secret).
    pub fn load_from_files(
        path_config: impl AsRef<Path>,
        path_secret_config: impl AsRef<Path>,
        version: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let read_doc = |path: &Path| -> Result<Map<String, Value>, ConfigError> {
            let text = std::fs::read_to_string(path)?;
            let value: Value = serde_json::from_str(&text)?;
            match value {
                Value::Object(map) => Ok(map),
                _ => Err(ConfigError::Internal(anyhow::anyhow!(
                    "config file {} is not a JSON object",
                    path.display()
                ))),
            }
        };
        Self::from_values(
            read_doc(path_config.as_ref())?,
            read_doc(path_secret_config.as_ref())?,
            version,
        )
    }

    /// Load the deployed payload back from its S3 backup.
    pub async fn load_from_s3(
        s3_client: &S3Client,
        s3folder_config: &str,
        parameter_name: &str,
    ) -> Result<Self, ConfigError> {
        let (payload, version) =
            crate::store::s3::read_config(s3_client, s3folder_config, parameter_name).await?;
        Self::from_payload(&payload, version)
    }

    /// Load the deployed payload from SSM Parameter Store.
    pub async fn load_from_parameter_store(
        ssm_client: &SsmClient,
        parameter_name: &str,
    ) -> Result<Self, ConfigError> {
        let parameter = get_parameter(ssm_client, parameter_name, true)
            .await?
            .ok_or_else(|| ConfigError::ParameterNotFound(parameter_name.to_string()))?;
        let payload: Value = serde_json::from_str(&parameter.value)?;
        Self::from_payload(&payload, parameter.version.to_string())
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn secret_data(&self) -> &Map<String, Value> {
        &self.secret_data
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_name_slug(&self) -> String {
        slugify(&self.project_name, "-")
    }

    pub fn project_name_snake(&self) -> String {
        slugify(&self.project_name, "_")
    }

    /// SSM parameter name of the consolidated all-environments config.
    pub fn parameter_name(&self) -> String {
        normalize_parameter_name(&self.project_name_snake())
    }

    /// Env names present in either document, shared section excluded.
    pub fn env_names(&self) -> Vec<String> {
        self.merged
            .keys()
            .filter(|k| *k != SHARED)
            .cloned()
            .collect()
    }

    /// Materialize one environment as the typed env struct.
    pub fn get_env(&self, env_name: impl AsRef<str>) -> Result<E, ConfigError> {
        let env_name = env_name.as_ref();
        if env_name == SHARED {
            return Err(ConfigError::UnknownEnv(env_name.to_string()));
        }
        let section = self
            .merged
            .get(env_name)
            .ok_or_else(|| ConfigError::UnknownEnv(env_name.to_string()))?;
        let mut value = section.clone();
        if let Value::Object(ref mut obj) = value {
            obj.insert("env_name".to_string(), json!(env_name));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parameter name and payload for one env, or for the consolidated
    /// config when `env_name` is `None` (or [`ALL_ENVS`]).
    ///
    /// A per-env payload carries only that env's sections plus the shared
    /// keys scoped `*.` or `<env>.`, so secrets of other environments never
    /// leave the admin side.
    pub fn env_parameter_payload(
        &self,
        env_name: Option<&str>,
    ) -> Result<(String, Value), ConfigError> {
        let env_name = match env_name {
            None => return Ok(self.all_parameter_payload()),
            Some(ALL_ENVS) => return Ok(self.all_parameter_payload()),
            Some(name) => name,
        };
        if !self.data.contains_key(env_name) {
            return Err(ConfigError::UnknownEnv(env_name.to_string()));
        }

        let scope = |doc: &Map<String, Value>| -> Value {
            let env_prefix = format!("{env_name}.");
            let shared: Map<String, Value> = doc
                .get(SHARED)
                .and_then(Value::as_object)
                .map(|shared| {
                    shared
                        .iter()
                        .filter(|(key, _)| key.starts_with("*.") || key.starts_with(&env_prefix))
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default();
            json!({
                SHARED: shared,
                env_name: doc.get(env_name).cloned().unwrap_or_else(|| json!({})),
            })
        };

        let parameter_name =
            normalize_parameter_name(&format!("{}-{}", self.project_name_snake(), env_name));
        let payload = json!({
            DATA: scope(&self.data),
            SECRET_DATA: scope(&self.secret_data),
        });
        Ok((parameter_name, payload))
    }

    fn all_parameter_payload(&self) -> (String, Value) {
        let payload = json!({
            DATA: self.data,
            SECRET_DATA: self.secret_data,
        });
        (self.parameter_name(), payload)
    }

    /// Deploy one env (or the consolidated config) to SSM and S3.
    ///
    /// SSM is written only when the value changed; S3 backup objects are
    /// written only after an SSM write, versioned by the new SSM parameter
    /// version.
    pub async fn deploy_env_parameter(
        &self,
        ssm_client: &SsmClient,
        s3_client: &S3Client,
        s3dir_config: &S3Uri,
        env_name: Option<&str>,
        options: &PutOptions,
    ) -> Result<DeploymentResult, ConfigError> {
        let (parameter_name, payload) = self.env_parameter_payload(env_name)?;
        let deployment = Deployment::new(
            parameter_name,
            payload,
            self.project_name.clone(),
            env_name.unwrap_or(ALL_ENVS),
            s3dir_config.clone(),
        );

        let (_before, after) = deployment.deploy_to_ssm(ssm_client, options).await?;
        let Some(after) = after else {
            return Ok(DeploymentResult::skipped());
        };

        let tags = deployment.resource_tags(&options.tags);
        let (s3uri_latest, s3uri_versioned) = deployment
            .deploy_to_s3(s3_client, after.version, &tags)
            .await?;
        Ok(DeploymentResult {
            parameter: Some(after),
            s3uri_latest: Some(s3uri_latest),
            s3uri_versioned: Some(s3uri_versioned),
        })
    }

    /// Delete the SSM parameter of one env (or the consolidated config).
    /// S3 backups are left in place.
    pub async fn delete_env_parameter(
        &self,
        ssm_client: &SsmClient,
        env_name: Option<&str>,
    ) -> Result<bool, ConfigError> {
        let (parameter_name, _) = self.env_parameter_payload(env_name)?;
        crate::store::ssm::delete_parameter(ssm_client, &parameter_name).await
    }

    /// Delete the SSM parameter and every S3 backup object.
    pub async fn delete_env_parameter_and_backups(
        &self,
        ssm_client: &SsmClient,
        s3_client: &S3Client,
        s3dir_config: &S3Uri,
        env_name: Option<&str>,
    ) -> Result<bool, ConfigError> {
        let (parameter_name, payload) = self.env_parameter_payload(env_name)?;
        let deployment = Deployment::new(
            parameter_name,
            payload,
            self.project_name.clone(),
            env_name.unwrap_or(ALL_ENVS),
            s3dir_config.clone(),
        );
        let existed = deployment.delete_from_ssm(ssm_client).await?;
        deployment.delete_all_from_s3(s3_client).await?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::env::{Env, EnvCore};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestEnv {
        #[serde(flatten)]
        core: EnvCore,
        username: String,
        password: String,
    }

    impl Env for TestEnv {
        fn core(&self) -> &EnvCore {
            &self.core
        }
    }

    fn sample_data() -> Map<String, Value> {
        json!({
            SHARED: {
                "*.project_name": "my_app",
                "*.aws_region": "us-east-1",
            },
            "dev": {
                "s3uri_data": "s3://myapp-dev/data/",
                "s3uri_artifacts": "s3://myapp-dev/artifacts/",
                "username": "alice",
            },
            "prod": {
                "s3uri_data": "s3://myapp-prod/data/",
                "s3uri_artifacts": "s3://myapp-prod/artifacts/",
                "username": "bob",
            },
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn sample_secret_data() -> Map<String, Value> {
        json!({
            "dev": {"aws_account_id": "111111111111", "password": "alicepassword"},
            "prod": {"aws_account_id": "111111111111", "password": "bobpassword"},
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn config() -> ConfigSet<TestEnv> {
        ConfigSet::from_values(sample_data(), sample_secret_data(), "0.1.1").unwrap()
    }

    #[test]
    fn test_happy_path() {
        let config = config();
        let env = config.get_env("dev").unwrap();
        assert_eq!(env.env_name(), "dev");
        assert_eq!(env.username, "alice");
        assert_eq!(env.password, "alicepassword");

        assert_eq!(config.project_name_snake(), "my_app");
        assert_eq!(config.project_name_slug(), "my-app");
        assert_eq!(config.parameter_name(), "my_app");
        assert_eq!(config.env_names(), vec!["dev".to_string(), "prod".to_string()]);
    }

    #[test]
    fn test_missing_project_name() {
        let mut data = sample_data();
        data.remove(SHARED);
        let err = ConfigSet::<TestEnv>::from_values(data, sample_secret_data(), "0.1.1");
        assert!(matches!(err, Err(ConfigError::MissingProjectName)));
    }

    #[test]
    fn test_invalid_env_name_rejected() {
        let mut data = sample_data();
        data.insert("Dev-1".to_string(), json!({}));
        let err = ConfigSet::<TestEnv>::from_values(data, sample_secret_data(), "0.1.1");
        assert!(matches!(err, Err(ConfigError::InvalidEnvName { .. })));
    }

    #[test]
    fn test_schema_mismatch_is_an_error() {
        let data = json!({
            SHARED: {"*.project_name": "my_app"},
            "dev": {
                "s3uri_data": "s3://myapp-dev/data/",
                "s3uri_artifacts": "s3://myapp-dev/artifacts/",
                "username": "alice",
            },
        })
        .as_object()
        .cloned()
        .unwrap();
        let secret = json!({"dev": {"password": 123456}}).as_object().cloned().unwrap();
        let config = ConfigSet::<TestEnv>::from_values(data, secret, "0.1.1").unwrap();
        assert!(matches!(config.get_env("dev"), Err(ConfigError::Schema(_))));
    }

    #[test]
    fn test_unknown_env() {
        let config = config();
        assert!(matches!(config.get_env("qa"), Err(ConfigError::UnknownEnv(_))));
        assert!(config.get_env(SHARED).is_err());
    }

    #[test]
    fn test_env_parameter_payload_scoping() {
        let config = config();
        let (parameter_name, payload) = config.env_parameter_payload(Some("dev")).unwrap();
        assert_eq!(parameter_name, "my_app-dev");

        // shared keys survive, the other env's sections do not
        assert_eq!(payload[DATA][SHARED]["*.project_name"], "my_app");
        assert_eq!(payload[DATA]["dev"]["username"], "alice");
        assert!(payload[DATA].get("prod").is_none());
        assert_eq!(payload[SECRET_DATA]["dev"]["password"], "alicepassword");
        assert!(payload[SECRET_DATA].get("prod").is_none());
    }

    #[test]
    fn test_env_scoped_shared_keys_are_kept() {
        let mut data = sample_data();
        if let Some(Value::Object(shared)) = data.get_mut(SHARED) {
            shared.insert("dev.flag".to_string(), json!(true));
            shared.insert("prod.flag".to_string(), json!(false));
        }
        let config =
            ConfigSet::<TestEnv>::from_values(data, sample_secret_data(), "0.1.1").unwrap();
        let (_, payload) = config.env_parameter_payload(Some("dev")).unwrap();
        assert_eq!(payload[DATA][SHARED]["dev.flag"], true);
        assert!(payload[DATA][SHARED].get("prod.flag").is_none());
    }

    #[test]
    fn test_all_parameter_payload() {
        let config = config();
        let (parameter_name, payload) = config.env_parameter_payload(None).unwrap();
        assert_eq!(parameter_name, "my_app");
        assert_eq!(payload[DATA]["prod"]["username"], "bob");
        assert_eq!(payload[SECRET_DATA]["prod"]["password"], "bobpassword");

        let (all_name, _) = config.env_parameter_payload(Some(ALL_ENVS)).unwrap();
        assert_eq!(all_name, parameter_name);
    }

    #[test]
    fn test_payload_round_trip() {
        let config = config();
        let (_, payload) = config.env_parameter_payload(None).unwrap();
        let restored = ConfigSet::<TestEnv>::from_payload(&payload, "2").unwrap();
        assert_eq!(restored.project_name(), "my_app");
        assert_eq!(restored.version(), "2");
        let env = restored.get_env("prod").unwrap();
        assert_eq!(env.username, "bob");
        assert_eq!(env.password, "bobpassword");
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let path_config = dir.path().join("config.json");
        let path_secret = dir.path().join("secret-config.json");
        std::fs::write(
            &path_config,
            serde_json::to_string_pretty(&Value::Object(sample_data())).unwrap(),
        )
        .unwrap();
        std::fs::write(
            &path_secret,
            serde_json::to_string_pretty(&Value::Object(sample_secret_data())).unwrap(),
        )
        .unwrap();

        let config =
            ConfigSet::<TestEnv>::load_from_files(&path_config, &path_secret, "0.1.1").unwrap();
        assert_eq!(config.get_env("dev").unwrap().username, "alice");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", config());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("alicepassword"));
    }
}
