//! Config storage in S3
//!
//! A config parameter lives in an S3 "config directory" and adapts to the
//! bucket's versioning mode:
//!
//! - versioning enabled: one object `<dir>/<name>.json`; S3 tracks versions
//!   natively, deletes create delete markers.
//! - versioning not enabled: `<dir>/<name>/<name>-latest.json` plus
//!   `<dir>/<name>/<name>-<NNNNNN>.json` per version; the current version
//!   number rides in object metadata.
//!
//! Suspended bucket versioning is rejected: some objects would carry real
//! version ids and others null, which breaks version tracking either way.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::BucketVersioningStatus;
use aws_sdk_s3::Client as S3Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::constants::{S3BucketVersionStatus, S3MetadataKey};
use crate::error::ConfigError;
use crate::store::location::S3Uri;
use crate::store::{s3_err, tagging_string};
use crate::utils::hash::sha256_of_config_data;
use crate::utils::version::ConfigVersion;

/// Summary of an object written to S3.
#[derive(Debug, Clone, Default)]
pub struct S3Object {
    pub bucket: String,
    pub key: String,
    pub etag: Option<String>,
    pub version_id: Option<String>,
    pub server_side_encryption: Option<String>,
    pub checksum_sha256: Option<String>,
}

impl S3Object {
    fn from_put(uri: &S3Uri, out: &aws_sdk_s3::operation::put_object::PutObjectOutput) -> Self {
        Self {
            bucket: uri.bucket().to_string(),
            key: uri.key().to_string(),
            etag: out.e_tag().map(str::to_string),
            version_id: out.version_id().map(str::to_string),
            server_side_encryption: out
                .server_side_encryption()
                .map(|v| v.as_str().to_string()),
            checksum_sha256: out.checksum_sha256().map(str::to_string),
        }
    }

    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Fetch the versioning status of a bucket. An absent status means
/// versioning was never enabled.
pub async fn get_bucket_version_status(
    client: &S3Client,
    bucket: &str,
) -> Result<S3BucketVersionStatus, ConfigError> {
    let out = client
        .get_bucket_versioning()
        .bucket(bucket)
        .send()
        .await
        .map_err(s3_err)?;
    Ok(match out.status() {
        Some(BucketVersioningStatus::Enabled) => S3BucketVersionStatus::Enabled,
        Some(BucketVersioningStatus::Suspended) => S3BucketVersionStatus::Suspended,
        _ => S3BucketVersionStatus::NotEnabled,
    })
}

/// A config parameter stored in an S3 config directory.
#[derive(Debug, Clone)]
pub struct S3Parameter {
    s3dir_config: S3Uri,
    parameter_name: String,
    version_status: S3BucketVersionStatus,
    s3uri_latest: S3Uri,
}

impl S3Parameter {
    /// Resolve the bucket's versioning mode and build the parameter layout.
    pub async fn new(
        client: &S3Client,
        s3folder_config: &str,
        parameter_name: &str,
    ) -> Result<Self, ConfigError> {
        let s3dir_config = S3Uri::parse(s3folder_config)?.into_dir();
        let status = get_bucket_version_status(client, s3dir_config.bucket()).await?;
        if status.is_suspended() {
            return Err(ConfigError::S3BucketVersionSuspended(
                s3dir_config.bucket().to_string(),
            ));
        }
        Ok(Self::with_status(s3dir_config, parameter_name, status))
    }

    /// Build the unversioned-bucket layout without querying S3. Used by
    /// deployments that track version numbers themselves.
    pub fn with_layout(s3dir_config: S3Uri, parameter_name: &str) -> Self {
        Self::with_status(
            s3dir_config.into_dir(),
            parameter_name,
            S3BucketVersionStatus::NotEnabled,
        )
    }

    fn with_status(
        s3dir_config: S3Uri,
        parameter_name: &str,
        version_status: S3BucketVersionStatus,
    ) -> Self {
        let s3uri_latest = if version_status.is_enabled() {
            s3dir_config.join(&format!("{parameter_name}.json"))
        } else {
            s3dir_config.join(&format!("{parameter_name}/{parameter_name}-latest.json"))
        };
        Self {
            s3dir_config,
            parameter_name: parameter_name.to_string(),
            version_status,
            s3uri_latest,
        }
    }

    pub fn s3dir_config(&self) -> &S3Uri {
        &self.s3dir_config
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn version_status(&self) -> S3BucketVersionStatus {
        self.version_status
    }

    pub fn version_enabled(&self) -> bool {
        self.version_status.is_enabled()
    }

    /// Location of the object representing the latest version.
    pub fn s3uri_latest(&self) -> &S3Uri {
        &self.s3uri_latest
    }

    /// Location of a numbered version in the unversioned-bucket layout.
    pub fn s3uri_versioned(&self, version: u64) -> S3Uri {
        self.s3uri_latest.with_file_name(&format!(
            "{}-{}.json",
            self.parameter_name,
            ConfigVersion::Number(version).zero_padded()
        ))
    }

    /// Read the latest config payload and its version.
    ///
    /// The version is the S3 version id for versioned buckets and the
    /// metadata-tracked sequence number for unversioned ones.
    pub async fn read_latest(&self, client: &S3Client) -> Result<(Value, String), ConfigError> {
        let out = match client
            .get_object()
            .bucket(self.s3uri_latest.bucket())
            .key(self.s3uri_latest.key())
            .send()
            .await
        {
            Ok(out) => out,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(ConfigError::S3ObjectNotExist(self.s3uri_latest.uri()));
                }
                return Err(s3_err(service_err));
            }
        };

        let config_version = if self.version_enabled() {
            out.version_id()
                .map(str::to_string)
                .unwrap_or_else(|| ConfigVersion::Latest.encode())
        } else {
            out.metadata()
                .and_then(|m| m.get(S3MetadataKey::ConfigVersion.as_str()))
                .cloned()
                .ok_or_else(|| {
                    ConfigError::S3(format!(
                        "object {} has no {} metadata",
                        self.s3uri_latest.uri(),
                        S3MetadataKey::ConfigVersion
                    ))
                })?
        };

        let bytes = out
            .body
            .collect()
            .await
            .map_err(|e| ConfigError::S3(e.to_string()))?
            .into_bytes();
        let config_data: Value = serde_json::from_slice(&bytes)?;
        Ok((config_data, config_version))
    }

    /// Latest version number in an unversioned bucket.
    ///
    /// Reads the latest object's metadata; if the latest object is gone
    /// (manual cleanup), falls back to scanning the versioned file names.
    pub async fn latest_version_when_not_enabled(
        &self,
        client: &S3Client,
    ) -> Result<Option<u64>, ConfigError> {
        match client
            .head_object()
            .bucket(self.s3uri_latest.bucket())
            .key(self.s3uri_latest.key())
            .send()
            .await
        {
            Ok(head) => {
                let version = head
                    .metadata()
                    .and_then(|m| m.get(S3MetadataKey::ConfigVersion.as_str()))
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| {
                        ConfigError::S3(format!(
                            "object {} has no usable {} metadata",
                            self.s3uri_latest.uri(),
                            S3MetadataKey::ConfigVersion
                        ))
                    })?;
                Ok(Some(version))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if !service_err.is_not_found() {
                    return Err(s3_err(service_err));
                }
                let out = client
                    .list_objects_v2()
                    .bucket(self.s3uri_latest.bucket())
                    .prefix(self.s3uri_latest.parent().key())
                    .send()
                    .await
                    .map_err(s3_err)?;
                let max = out
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .filter_map(parse_version_from_key)
                    .max();
                Ok(max)
            }
        }
    }

    /// Latest version id in a versioned bucket, skipping a delete marker
    /// if one sits on top.
    pub async fn latest_version_when_enabled(
        &self,
        client: &S3Client,
    ) -> Result<Option<String>, ConfigError> {
        let out = client
            .list_object_versions()
            .bucket(self.s3uri_latest.bucket())
            .prefix(self.s3uri_latest.key())
            .max_keys(2)
            .send()
            .await
            .map_err(s3_err)?;
        let key = self.s3uri_latest.key();
        let latest_is_delete_marker = out
            .delete_markers()
            .iter()
            .any(|m| m.key() == Some(key) && m.is_latest() == Some(true));
        let versions: Vec<&str> = out
            .versions()
            .iter()
            .filter(|v| v.key() == Some(key))
            .filter_map(|v| v.version_id())
            .collect();
        if latest_is_delete_marker || !versions.is_empty() {
            // versions are listed newest first
            Ok(versions.first().map(|v| v.to_string()))
        } else {
            Ok(None)
        }
    }

    /// Deploy to an unversioned bucket: write the numbered object, then
    /// copy it over the latest object (the copy carries the metadata).
    pub async fn deploy_latest_when_not_enabled(
        &self,
        client: &S3Client,
        config_data: &Value,
        config_version: u64,
        tags: &BTreeMap<String, String>,
    ) -> Result<S3Object, ConfigError> {
        let s3uri_versioned = self.s3uri_versioned(config_version);
        let content = serde_json::to_string_pretty(config_data)?;
        let metadata = HashMap::from([
            (
                S3MetadataKey::ConfigVersion.to_string(),
                config_version.to_string(),
            ),
            (
                S3MetadataKey::ConfigSha256.to_string(),
                sha256_of_config_data(config_data),
            ),
        ]);
        let out = self
            .put_json(client, &s3uri_versioned, content, metadata, tags)
            .await?;
        let s3object = S3Object::from_put(&s3uri_versioned, &out);

        client
            .copy_object()
            .copy_source(format!(
                "{}/{}",
                s3uri_versioned.bucket(),
                s3uri_versioned.key()
            ))
            .bucket(self.s3uri_latest.bucket())
            .key(self.s3uri_latest.key())
            .send()
            .await
            .map_err(s3_err)?;
        Ok(s3object)
    }

    /// Deploy to a versioned bucket: one put, S3 assigns the version id.
    pub async fn deploy_latest_when_enabled(
        &self,
        client: &S3Client,
        config_data: &Value,
        tags: &BTreeMap<String, String>,
    ) -> Result<S3Object, ConfigError> {
        let content = serde_json::to_string_pretty(config_data)?;
        let metadata = HashMap::from([(
            S3MetadataKey::ConfigSha256.to_string(),
            sha256_of_config_data(config_data),
        )]);
        let out = self
            .put_json(client, &self.s3uri_latest, content, metadata, tags)
            .await?;
        Ok(S3Object::from_put(&self.s3uri_latest, &out))
    }

    /// Write an already-serialized payload to the latest object, stamping
    /// the given version in metadata. Unversioned layout only.
    pub async fn write_latest(
        &self,
        client: &S3Client,
        value: &str,
        config_version: i64,
        tags: &BTreeMap<String, String>,
    ) -> Result<S3Uri, ConfigError> {
        let metadata = self.value_metadata(value, config_version);
        self.put_json(client, &self.s3uri_latest, value.to_string(), metadata, tags)
            .await?;
        Ok(self.s3uri_latest.clone())
    }

    /// Write an already-serialized payload to the numbered versioned
    /// object. Unversioned layout only.
    pub async fn write_versioned(
        &self,
        client: &S3Client,
        value: &str,
        config_version: i64,
        tags: &BTreeMap<String, String>,
    ) -> Result<S3Uri, ConfigError> {
        let s3uri = self.s3uri_versioned(config_version.max(0) as u64);
        let metadata = self.value_metadata(value, config_version);
        self.put_json(client, &s3uri, value.to_string(), metadata, tags)
            .await?;
        Ok(s3uri)
    }

    fn value_metadata(&self, value: &str, config_version: i64) -> HashMap<String, String> {
        HashMap::from([
            (
                S3MetadataKey::ConfigVersion.to_string(),
                config_version.to_string(),
            ),
            (
                S3MetadataKey::ConfigSha256.to_string(),
                crate::utils::hash::sha256_of_text(value),
            ),
        ])
    }

    async fn put_json(
        &self,
        client: &S3Client,
        s3uri: &S3Uri,
        content: String,
        metadata: HashMap<String, String>,
        tags: &BTreeMap<String, String>,
    ) -> Result<aws_sdk_s3::operation::put_object::PutObjectOutput, ConfigError> {
        tracing::debug!(uri = %s3uri, "writing config object");
        client
            .put_object()
            .bucket(s3uri.bucket())
            .key(s3uri.key())
            .body(ByteStream::from(content.into_bytes()))
            .content_type("application/json")
            .set_metadata(Some(metadata))
            .set_tagging(tagging_string(tags))
            .send()
            .await
            .map_err(s3_err)
    }

    /// Delete the latest object. In a versioned bucket this creates a
    /// delete marker; history stays recoverable.
    pub async fn delete_latest(&self, client: &S3Client) -> Result<(), ConfigError> {
        client
            .delete_object()
            .bucket(self.s3uri_latest.bucket())
            .key(self.s3uri_latest.key())
            .send()
            .await
            .map_err(s3_err)?;
        Ok(())
    }

    /// Permanently delete the parameter and all of its history.
    pub async fn delete_history(&self, client: &S3Client) -> Result<(), ConfigError> {
        if self.version_enabled() {
            let out = client
                .list_object_versions()
                .bucket(self.s3uri_latest.bucket())
                .prefix(self.s3uri_latest.key())
                .send()
                .await
                .map_err(s3_err)?;
            let key = self.s3uri_latest.key();
            let mut targets: Vec<Option<String>> = Vec::new();
            for v in out.versions() {
                if v.key() == Some(key) {
                    targets.push(v.version_id().map(str::to_string));
                }
            }
            for m in out.delete_markers() {
                if m.key() == Some(key) {
                    targets.push(m.version_id().map(str::to_string));
                }
            }
            for version_id in targets {
                client
                    .delete_object()
                    .bucket(self.s3uri_latest.bucket())
                    .key(key)
                    .set_version_id(version_id)
                    .send()
                    .await
                    .map_err(s3_err)?;
            }
        } else {
            let dir = self.s3uri_latest.parent();
            let mut pages = client
                .list_objects_v2()
                .bucket(dir.bucket())
                .prefix(dir.key())
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(s3_err)?;
                for obj in page.contents() {
                    if let Some(key) = obj.key() {
                        client
                            .delete_object()
                            .bucket(dir.bucket())
                            .key(key)
                            .send()
                            .await
                            .map_err(s3_err)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Parse the sequence number out of a versioned object key, e.g.
/// `config/myapp/myapp-000003.json` yields 3.
fn parse_version_from_key(key: &str) -> Option<u64> {
    let file_name = key.rsplit('/').next()?;
    let stem = file_name.strip_suffix(".json")?;
    let (_, version) = stem.rsplit_once('-')?;
    version.parse().ok()
}

/// Deploy a config payload, picking the strategy for the bucket's
/// versioning mode. Returns `None` when the stored payload is already
/// identical and nothing was written.
pub async fn deploy_config(
    client: &S3Client,
    s3folder_config: &str,
    parameter_name: &str,
    config_data: &Value,
    tags: &BTreeMap<String, String>,
) -> Result<Option<S3Object>, ConfigError> {
    let s3parameter = S3Parameter::new(client, s3folder_config, parameter_name).await?;
    let s3uri_latest = s3parameter.s3uri_latest();
    tracing::info!(uri = %s3uri_latest, console = %s3uri_latest.console_url(), "deploying config to S3");

    match s3parameter.read_latest(client).await {
        Ok((existing, _)) if &existing == config_data => {
            tracing::info!("config data matches the deployed one, nothing to do");
            return Ok(None);
        }
        Ok(_) => {}
        Err(ConfigError::S3ObjectNotExist(_)) => {}
        Err(err) => return Err(err),
    }

    let s3object = if s3parameter.version_enabled() {
        s3parameter
            .deploy_latest_when_enabled(client, config_data, tags)
            .await?
    } else {
        let new_version = s3parameter
            .latest_version_when_not_enabled(client)
            .await?
            .map_or(1, |v| v + 1);
        s3parameter
            .deploy_latest_when_not_enabled(client, config_data, new_version, tags)
            .await?
    };
    tracing::info!(uri = %s3object.uri(), "config deployed");
    Ok(Some(s3object))
}

/// Read the latest config payload and version from S3.
pub async fn read_config(
    client: &S3Client,
    s3folder_config: &str,
    parameter_name: &str,
) -> Result<(Value, String), ConfigError> {
    let s3parameter = S3Parameter::new(client, s3folder_config, parameter_name).await?;
    s3parameter.read_latest(client).await
}

/// Delete a deployed config.
///
/// Without `include_history` only the latest object goes away (a delete
/// marker in versioned buckets); historical versions survive as backups.
pub async fn delete_config(
    client: &S3Client,
    s3folder_config: &str,
    parameter_name: &str,
    include_history: bool,
) -> Result<bool, ConfigError> {
    let s3parameter = S3Parameter::new(client, s3folder_config, parameter_name).await?;
    let s3uri_latest = s3parameter.s3uri_latest();
    tracing::info!(uri = %s3uri_latest, include_history, "deleting config from S3");
    if include_history {
        s3parameter.delete_history(client).await?;
    } else {
        s3parameter.delete_latest(client).await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir() -> S3Uri {
        S3Uri::parse("s3://my-bucket/config").unwrap()
    }

    #[test]
    fn test_unversioned_layout() {
        let param = S3Parameter::with_layout(dir(), "myapp");
        assert!(!param.version_enabled());
        assert_eq!(
            param.s3uri_latest().uri(),
            "s3://my-bucket/config/myapp/myapp-latest.json"
        );
        assert_eq!(
            param.s3uri_versioned(1).uri(),
            "s3://my-bucket/config/myapp/myapp-000001.json"
        );
        assert_eq!(
            param.s3uri_versioned(123456).uri(),
            "s3://my-bucket/config/myapp/myapp-123456.json"
        );
    }

    #[test]
    fn test_versioned_layout() {
        let param = S3Parameter::with_status(
            dir().into_dir(),
            "myapp",
            S3BucketVersionStatus::Enabled,
        );
        assert!(param.version_enabled());
        assert_eq!(param.s3uri_latest().uri(), "s3://my-bucket/config/myapp.json");
    }

    #[test]
    fn test_parse_version_from_key() {
        assert_eq!(parse_version_from_key("config/myapp/myapp-000003.json"), Some(3));
        assert_eq!(parse_version_from_key("config/myapp/myapp-123456.json"), Some(123456));
        assert_eq!(parse_version_from_key("config/myapp/myapp-latest.json"), None);
        assert_eq!(parse_version_from_key("config/myapp/readme.txt"), None);
    }

    #[test]
    fn test_value_metadata_contains_version_and_sha() {
        let param = S3Parameter::with_layout(dir(), "myapp");
        let metadata = param.value_metadata("{}", 7);
        assert_eq!(metadata["config_version"], "7");
        assert_eq!(
            metadata["config_sha256"],
            crate::utils::hash::sha256_of_text("{}")
        );
    }
}
