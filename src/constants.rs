//! Shared constants and well-known enumerations
//!
//! Key names here are part of the stored data layout: changing them breaks
//! compatibility with configs already deployed to SSM and S3.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key of the shared-defaults section inside a config document.
///
/// The leading underscore keeps it from colliding with env names, which must
/// start with a letter.
pub const SHARED: &str = "_shared";

/// Pseudo env name addressing the consolidated, all-environments parameter.
pub const ALL_ENVS: &str = "all";

/// Key of the non-sensitive document inside a deployed payload.
pub const DATA: &str = "data";

/// Key of the sensitive document inside a deployed payload.
pub const SECRET_DATA: &str = "secret_data";

/// Width of zero-padded custom version numbers in S3 object names.
/// Supports up to 999999 versions.
pub const ZFILL: usize = 6;

/// Marker for "the newest version" in version arguments.
pub const LATEST_VERSION: &str = "LATEST";

/// Versioning status of an S3 bucket.
///
/// - `NotEnabled`: the bucket never had versioning turned on.
/// - `Enabled`: the bucket versions objects natively.
/// - `Suspended`: versioning was on and is now suspended. Config files are
///   not stored in suspended buckets; the mixed null/real version ids make
///   version tracking unreliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum S3BucketVersionStatus {
    NotEnabled,
    Enabled,
    Suspended,
}

impl S3BucketVersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            S3BucketVersionStatus::NotEnabled => "NotEnabled",
            S3BucketVersionStatus::Enabled => "Enabled",
            S3BucketVersionStatus::Suspended => "Suspended",
        }
    }

    pub fn is_not_enabled(&self) -> bool {
        matches!(self, S3BucketVersionStatus::NotEnabled)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, S3BucketVersionStatus::Enabled)
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, S3BucketVersionStatus::Suspended)
    }
}

impl fmt::Display for S3BucketVersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for S3BucketVersionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotEnabled" => Ok(S3BucketVersionStatus::NotEnabled),
            "Enabled" => Ok(S3BucketVersionStatus::Enabled),
            "Suspended" => Ok(S3BucketVersionStatus::Suspended),
            _ => anyhow::bail!(
                "Invalid bucket versioning status: {}. Expected: NotEnabled, Enabled, or Suspended",
                s
            ),
        }
    }
}

/// Keys of AWS resource tags attached to deployed parameters and S3 objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwsTagKey {
    ProjectName,
    EnvName,
    ConfigVersion,
    ConfigSha256,
}

impl AwsTagKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwsTagKey::ProjectName => "project_name",
            AwsTagKey::EnvName => "env_name",
            AwsTagKey::ConfigVersion => "config_version",
            AwsTagKey::ConfigSha256 => "config_sha256",
        }
    }
}

impl fmt::Display for AwsTagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys of S3 object metadata written alongside config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S3MetadataKey {
    ConfigVersion,
    ConfigSha256,
}

impl S3MetadataKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            S3MetadataKey::ConfigVersion => "config_version",
            S3MetadataKey::ConfigSha256 => "config_sha256",
        }
    }
}

impl fmt::Display for S3MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of process environment variables an env exports for its workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvVarName {
    ProjectName,
    EnvName,
    ParameterName,
}

impl EnvVarName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvVarName::ProjectName => "PROJECT_NAME",
            EnvVarName::EnvName => "ENV_NAME",
            EnvVarName::ParameterName => "PARAMETER_NAME",
        }
    }
}

impl fmt::Display for EnvVarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_status_round_trip() {
        for status in [
            S3BucketVersionStatus::NotEnabled,
            S3BucketVersionStatus::Enabled,
            S3BucketVersionStatus::Suspended,
        ] {
            assert_eq!(status.as_str().parse::<S3BucketVersionStatus>().unwrap(), status);
        }
        assert!("enabled".parse::<S3BucketVersionStatus>().is_err());
    }

    #[test]
    fn test_version_status_predicates() {
        assert!(S3BucketVersionStatus::NotEnabled.is_not_enabled());
        assert!(S3BucketVersionStatus::Enabled.is_enabled());
        assert!(S3BucketVersionStatus::Suspended.is_suspended());
        assert!(!S3BucketVersionStatus::Enabled.is_suspended());
    }

    #[test]
    fn test_tag_and_metadata_keys() {
        assert_eq!(AwsTagKey::ProjectName.as_str(), "project_name");
        assert_eq!(AwsTagKey::ConfigSha256.as_str(), "config_sha256");
        assert_eq!(S3MetadataKey::ConfigVersion.to_string(), "config_version");
        assert_eq!(EnvVarName::ParameterName.as_str(), "PARAMETER_NAME");
    }
}
