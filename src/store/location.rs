//! S3 location value type
//!
//! A thin `s3://bucket/key` wrapper so the rest of the crate can pass
//! locations around, join paths, and render console URLs without string
//! surgery at every call site.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An S3 location, either an object (`s3://bucket/a/b.json`) or a
/// directory-like prefix (`s3://bucket/a/`, trailing slash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct S3Uri {
    bucket: String,
    key: String,
}

impl S3Uri {
    /// Parse an `s3://bucket/key` URI.
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| ConfigError::InvalidS3Uri(uri.to_string()))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(ConfigError::InvalidS3Uri(uri.to_string()));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Full `s3://` URI.
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Whether this location is a directory-like prefix.
    pub fn is_dir(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }

    /// Coerce to directory form by appending a trailing slash if missing.
    pub fn into_dir(mut self) -> Self {
        if !self.is_dir() {
            self.key.push('/');
        }
        self
    }

    /// Join a relative part onto this location, treating `self` as a
    /// directory. The part may itself contain slashes.
    pub fn join(&self, part: &str) -> Self {
        let mut key = self.key.clone();
        if !key.is_empty() && !key.ends_with('/') {
            key.push('/');
        }
        key.push_str(part.trim_start_matches('/'));
        Self {
            bucket: self.bucket.clone(),
            key,
        }
    }

    /// Parent directory of this object or prefix.
    pub fn parent(&self) -> Self {
        let trimmed = self.key.trim_end_matches('/');
        let key = match trimmed.rfind('/') {
            Some(idx) => format!("{}/", &trimmed[..idx]),
            None => String::new(),
        };
        Self {
            bucket: self.bucket.clone(),
            key,
        }
    }

    /// Final path component, if this is an object location.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_dir() {
            return None;
        }
        Some(self.key.rsplit('/').next().unwrap_or(&self.key))
    }

    /// Sibling object with a different file name.
    pub fn with_file_name(&self, name: &str) -> Self {
        self.parent().join(name)
    }

    /// AWS console URL for this object or prefix.
    pub fn console_url(&self) -> String {
        if self.is_dir() {
            format!(
                "https://console.aws.amazon.com/s3/buckets/{}?prefix={}",
                self.bucket, self.key
            )
        } else {
            format!(
                "https://console.aws.amazon.com/s3/object/{}?prefix={}",
                self.bucket, self.key
            )
        }
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl FromStr for S3Uri {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for S3Uri {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<S3Uri> for String {
    fn from(value: S3Uri) -> Self {
        value.uri()
    }
}
