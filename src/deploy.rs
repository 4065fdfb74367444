//! Deployment of a config payload to SSM Parameter Store and S3
//!
//! SSM is the runtime read path; S3 keeps a `latest` object plus one
//! object per SSM parameter version as the backup trail. S3 objects are
//! only written when the SSM value actually changed.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_ssm::Client as SsmClient;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::AwsTagKey;
use crate::error::ConfigError;
use crate::store::s3::S3Parameter;
use crate::store::ssm::{delete_parameter, put_parameter_if_changed, Parameter, PutOptions};
use crate::store::S3Uri;
use crate::utils::hash::sha256_of_config_data;

/// Outcome of deploying one config payload.
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    /// The SSM parameter after deployment; `None` when the value was
    /// already up to date.
    pub parameter: Option<Parameter>,
    /// The `latest` backup object, when S3 was written.
    pub s3uri_latest: Option<S3Uri>,
    /// The per-version backup object, when S3 was written.
    pub s3uri_versioned: Option<S3Uri>,
}

impl DeploymentResult {
    /// Whether an SSM write happened.
    pub fn is_ssm_deployed(&self) -> bool {
        self.parameter.is_some()
    }

    /// Whether S3 backup objects were written.
    pub fn is_s3_deployed(&self) -> bool {
        self.s3uri_latest.is_some()
    }

    pub(crate) fn skipped() -> Self {
        Self {
            parameter: None,
            s3uri_latest: None,
            s3uri_versioned: None,
        }
    }
}

/// One config payload bound for AWS, with everything needed to deploy or
/// clean it up.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub parameter_name: String,
    pub parameter_data: Value,
    pub project_name: String,
    pub env_name: String,
    pub s3dir_config: S3Uri,
}

impl Deployment {
    pub fn new(
        parameter_name: impl Into<String>,
        parameter_data: Value,
        project_name: impl Into<String>,
        env_name: impl Into<String>,
        s3dir_config: S3Uri,
    ) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            parameter_data,
            project_name: project_name.into(),
            env_name: env_name.into(),
            s3dir_config,
        }
    }

    /// The serialized parameter value.
    pub fn parameter_value(&self) -> String {
        serde_json::to_string(&self.parameter_data).expect("a JSON value serializes")
    }

    /// Standard resource tags for this deployment, merged over `extra`.
    pub fn resource_tags(&self, extra: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut tags = extra.clone();
        tags.insert(
            AwsTagKey::ProjectName.to_string(),
            self.project_name.clone(),
        );
        tags.insert(AwsTagKey::EnvName.to_string(), self.env_name.clone());
        tags.insert(
            AwsTagKey::ConfigSha256.to_string(),
            sha256_of_config_data(&self.parameter_data),
        );
        tags
    }

    /// Deploy to SSM Parameter Store, skipping the write when the value
    /// is unchanged. Returns `(before, after)`.
    pub async fn deploy_to_ssm(
        &self,
        ssm_client: &SsmClient,
        options: &PutOptions,
    ) -> Result<(Option<Parameter>, Option<Parameter>), ConfigError> {
        let mut effective = options.clone();
        effective.tags = self.resource_tags(&options.tags);
        put_parameter_if_changed(
            ssm_client,
            &self.parameter_name,
            &self.parameter_value(),
            &effective,
        )
        .await
    }

    /// Write the S3 backup pair for a given SSM parameter version.
    pub async fn deploy_to_s3(
        &self,
        s3_client: &S3Client,
        version: i64,
        tags: &BTreeMap<String, String>,
    ) -> Result<(S3Uri, S3Uri), ConfigError> {
        let s3_parameter =
            S3Parameter::with_layout(self.s3dir_config.clone(), &self.parameter_name);
        let value = self.parameter_value();
        let s3uri_latest = s3_parameter
            .write_latest(s3_client, &value, version, tags)
            .await?;
        let s3uri_versioned = s3_parameter
            .write_versioned(s3_client, &value, version, tags)
            .await?;
        Ok((s3uri_latest, s3uri_versioned))
    }

    /// Delete the SSM parameter. Returns whether it existed.
    pub async fn delete_from_ssm(&self, ssm_client: &SsmClient) -> Result<bool, ConfigError> {
        delete_parameter(ssm_client, &self.parameter_name).await
    }

    /// Delete S3 backups: the latest object, or one numbered version.
    pub async fn delete_from_s3(
        &self,
        s3_client: &S3Client,
        version: Option<u64>,
    ) -> Result<(), ConfigError> {
        let s3_parameter =
            S3Parameter::with_layout(self.s3dir_config.clone(), &self.parameter_name);
        match version {
            None => s3_parameter.delete_latest(s3_client).await,
            Some(version) => {
                let s3uri = s3_parameter.s3uri_versioned(version);
                s3_client
                    .delete_object()
                    .bucket(s3uri.bucket())
                    .key(s3uri.key())
                    .send()
                    .await
                    .map_err(|e| {
                        ConfigError::S3(
                            aws_smithy_types::error::display::DisplayErrorContext(e).to_string(),
                        )
                    })?;
                Ok(())
            }
        }
    }

    /// Delete every S3 backup object of this deployment.
    pub async fn delete_all_from_s3(&self, s3_client: &S3Client) -> Result<(), ConfigError> {
        S3Parameter::with_layout(self.s3dir_config.clone(), &self.parameter_name)
            .delete_history(s3_client)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment() -> Deployment {
        Deployment::new(
            "my_app-dev",
            json!({"data": {"dev": {"username": "alice"}}, "secret_data": {}}),
            "my_app",
            "dev",
            S3Uri::parse("s3://my-bucket/config/").unwrap(),
        )
    }

    #[test]
    fn test_parameter_value_is_compact_json() {
        let value = deployment().parameter_value();
        let parsed: Value = serde_json::from_str(&value).unwrap();
        assert_eq!(parsed["data"]["dev"]["username"], "alice");
        assert!(!value.contains('\n'));
    }

    #[test]
    fn test_resource_tags() {
        let deployment = deployment();
        let extra = BTreeMap::from([("creator".to_string(), "alice".to_string())]);
        let tags = deployment.resource_tags(&extra);
        assert_eq!(tags["creator"], "alice");
        assert_eq!(tags["project_name"], "my_app");
        assert_eq!(tags["env_name"], "dev");
        assert_eq!(
            tags["config_sha256"],
            sha256_of_config_data(&deployment.parameter_data)
        );
    }

    #[test]
    fn test_standard_tags_win_over_extra() {
        let deployment = deployment();
        let extra = BTreeMap::from([("project_name".to_string(), "spoofed".to_string())]);
        assert_eq!(deployment.resource_tags(&extra)["project_name"], "my_app");
    }

    #[test]
    fn test_deployment_result_flags() {
        let skipped = DeploymentResult::skipped();
        assert!(!skipped.is_ssm_deployed());
        assert!(!skipped.is_s3_deployed());

        let deployed = DeploymentResult {
            parameter: Some(Parameter {
                name: "my_app-dev".to_string(),
                value: "{}".to_string(),
                version: 1,
                parameter_type: None,
            }),
            s3uri_latest: Some(S3Uri::parse("s3://b/config/x-latest.json").unwrap()),
            s3uri_versioned: Some(S3Uri::parse("s3://b/config/x-000001.json").unwrap()),
        };
        assert!(deployed.is_ssm_deployed());
        assert!(deployed.is_s3_deployed());
    }
}
