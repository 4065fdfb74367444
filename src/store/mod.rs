//! Storage backends for deployed configuration
//!
//! S3 holds versioned backups; SSM Parameter Store serves runtime reads.

pub mod location;
pub mod s3;
pub mod ssm;

pub use location::S3Uri;
pub use s3::{
    delete_config, deploy_config, get_bucket_version_status, read_config, S3Object, S3Parameter,
};
pub use ssm::{delete_parameter, get_parameter, put_parameter_if_changed, Parameter, PutOptions};

use crate::error::ConfigError;
use aws_smithy_types::error::display::DisplayErrorContext;
use std::collections::BTreeMap;

pub(crate) fn s3_err<E: std::error::Error>(err: E) -> ConfigError {
    ConfigError::S3(DisplayErrorContext(err).to_string())
}

pub(crate) fn ssm_err<E: std::error::Error>(err: E) -> ConfigError {
    ConfigError::Ssm(DisplayErrorContext(err).to_string())
}

/// Render tags as the `key=value&key=value` string S3 tagging expects.
/// Returns `None` for an empty map so the request carries no tag header.
pub(crate) fn tagging_string(tags: &BTreeMap<String, String>) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    Some(
        tags.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagging_string() {
        assert_eq!(tagging_string(&BTreeMap::new()), None);
        let tags = BTreeMap::from([
            ("env_name".to_string(), "dev".to_string()),
            ("project_name".to_string(), "my_app".to_string()),
        ]);
        assert_eq!(
            tagging_string(&tags).unwrap(),
            "env_name=dev&project_name=my_app"
        );
    }
}
