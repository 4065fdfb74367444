//! Config storage in SSM Parameter Store

use aws_sdk_ssm::types::{ParameterTier, ParameterType, ResourceTypeForTagging, Tag};
use aws_sdk_ssm::Client as SsmClient;
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::store::ssm_err;

/// Summary of an SSM parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub version: i64,
    pub parameter_type: Option<ParameterType>,
}

impl Parameter {
    fn from_sdk(parameter: &aws_sdk_ssm::types::Parameter) -> Option<Self> {
        Some(Self {
            name: parameter.name()?.to_string(),
            value: parameter.value()?.to_string(),
            version: parameter.version(),
            parameter_type: parameter.r#type().cloned(),
        })
    }
}

/// Options for `put_parameter` calls, with builder-style setters.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub description: Option<String>,
    pub parameter_type: Option<ParameterType>,
    pub tier: Option<ParameterTier>,
    pub key_id: Option<String>,
    pub overwrite: bool,
    pub allowed_pattern: Option<String>,
    pub policies: Option<String>,
    pub data_type: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, parameter_type: ParameterType) -> Self {
        self.parameter_type = Some(parameter_type);
        self
    }

    pub fn with_tier(mut self, tier: ParameterTier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_allowed_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_pattern = Some(pattern.into());
        self
    }

    pub fn with_policies(mut self, policies: impl Into<String>) -> Self {
        self.policies = Some(policies.into());
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Get a parameter. Missing parameters yield `None`.
pub async fn get_parameter(
    client: &SsmClient,
    name: &str,
    with_decryption: bool,
) -> Result<Option<Parameter>, ConfigError> {
    match client
        .get_parameter()
        .name(name)
        .with_decryption(with_decryption)
        .send()
        .await
    {
        Ok(out) => Ok(out.parameter().and_then(Parameter::from_sdk)),
        Err(err) => {
            let service_err = err.into_service_error();
            if service_err.is_parameter_not_found() {
                Ok(None)
            } else {
                Err(ssm_err(service_err))
            }
        }
    }
}

/// Put a parameter only when its value changed.
///
/// Returns `(before, after)`: `after` is `None` when the stored value is
/// already identical and no write happened. Tags go through
/// `add_tags_to_resource`, since `put_parameter` rejects tags combined
/// with overwrite.
pub async fn put_parameter_if_changed(
    client: &SsmClient,
    name: &str,
    value: &str,
    options: &PutOptions,
) -> Result<(Option<Parameter>, Option<Parameter>), ConfigError> {
    let before = get_parameter(client, name, true).await?;
    if let Some(ref existing) = before {
        if existing.value == value {
            tracing::debug!(name, "parameter value unchanged, skipping put");
            return Ok((before, None));
        }
    }

    // creating a parameter requires a type; overwriting keeps the old one
    let parameter_type = options.parameter_type.clone().or_else(|| {
        if before.is_none() {
            Some(ParameterType::String)
        } else {
            None
        }
    });

    let out = client
        .put_parameter()
        .name(name)
        .value(value)
        .overwrite(before.is_some() || options.overwrite)
        .set_type(parameter_type.clone())
        .set_description(options.description.clone())
        .set_tier(options.tier.clone())
        .set_key_id(options.key_id.clone())
        .set_allowed_pattern(options.allowed_pattern.clone())
        .set_policies(options.policies.clone())
        .set_data_type(options.data_type.clone())
        .send()
        .await
        .map_err(ssm_err)?;

    if !options.tags.is_empty() {
        let mut tags = Vec::with_capacity(options.tags.len());
        for (key, tag_value) in &options.tags {
            tags.push(
                Tag::builder()
                    .key(key)
                    .value(tag_value)
                    .build()
                    .map_err(ssm_err)?,
            );
        }
        client
            .add_tags_to_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(name)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(ssm_err)?;
    }

    tracing::info!(name, version = out.version(), "parameter deployed");
    let after = Parameter {
        name: name.to_string(),
        value: value.to_string(),
        version: out.version(),
        parameter_type: parameter_type
            .or_else(|| before.as_ref().and_then(|p| p.parameter_type.clone())),
    };
    Ok((before, Some(after)))
}

/// Delete a parameter. Returns whether it existed.
pub async fn delete_parameter(client: &SsmClient, name: &str) -> Result<bool, ConfigError> {
    match client.delete_parameter().name(name).send().await {
        Ok(_) => {
            tracing::info!(name, "parameter deleted");
            Ok(true)
        }
        Err(err) => {
            let service_err = err.into_service_error();
            if service_err.is_parameter_not_found() {
                Ok(false)
            } else {
                Err(ssm_err(service_err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_options_builder() {
        let options = PutOptions::new()
            .with_description("app config")
            .with_type(ParameterType::SecureString)
            .with_tier(ParameterTier::Standard)
            .with_overwrite(true)
            .with_tag("team", "platform");
        assert_eq!(options.description.as_deref(), Some("app config"));
        assert_eq!(options.parameter_type, Some(ParameterType::SecureString));
        assert!(options.overwrite);
        assert_eq!(options.tags["team"], "platform");
    }

    #[test]
    fn test_put_options_default_is_empty() {
        let options = PutOptions::default();
        assert!(options.description.is_none());
        assert!(options.parameter_type.is_none());
        assert!(!options.overwrite);
        assert!(options.tags.is_empty());
    }
}
