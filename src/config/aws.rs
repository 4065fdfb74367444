//! AWS SDK configuration
//!
//! This module provides AWS SDK configuration for the S3 and SSM clients,
//! supporting custom endpoints for local development and testing.

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::Client as S3SdkClient;
use aws_sdk_ssm::Client as SsmSdkClient;

use crate::config::Settings;

/// AWS configuration builder
///
/// Creates AWS SDK configuration with support for:
/// - Custom regions
/// - Credential providers (environment, instance profile, etc.)
/// - Custom endpoint URLs for local testing
pub struct AwsConfigBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> AwsConfigBuilder<'a> {
    /// Create a new AWS configuration builder
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Build the base AWS SDK configuration
    ///
    /// This configuration is used as the foundation for all AWS service clients.
    /// It handles:
    /// - Region configuration from settings
    /// - Credential chain (env vars, instance profile, etc.)
    pub async fn build_sdk_config(&self) -> SdkConfig {
        let region_provider =
            RegionProviderChain::first_try(Region::new(self.settings.aws_region.clone()))
                .or_default_provider();

        aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await
    }

    /// Create an S3 client with optional custom endpoint
    ///
    /// If `S3_ENDPOINT_URL` is set in settings, the client will use that
    /// endpoint (useful for MinIO or LocalStack).
    pub async fn build_s3_client(&self) -> S3SdkClient {
        let sdk_config = self.build_sdk_config().await;

        if let Some(endpoint_url) = &self.settings.s3_endpoint_url {
            tracing::info!(endpoint = %endpoint_url, "Using custom S3 endpoint");

            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint_url)
                .force_path_style(true)
                .build();

            S3SdkClient::from_conf(s3_config)
        } else {
            S3SdkClient::new(&sdk_config)
        }
    }

    /// Create an SSM client with optional custom endpoint
    ///
    /// If `SSM_ENDPOINT_URL` is set in settings, the client will use that
    /// endpoint (useful for LocalStack).
    pub async fn build_ssm_client(&self) -> SsmSdkClient {
        let sdk_config = self.build_sdk_config().await;

        if let Some(endpoint_url) = &self.settings.ssm_endpoint_url {
            tracing::info!(endpoint = %endpoint_url, "Using custom SSM endpoint");

            let ssm_config = aws_sdk_ssm::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint_url)
                .build();

            SsmSdkClient::from_conf(ssm_config)
        } else {
            SsmSdkClient::new(&sdk_config)
        }
    }
}

/// Build AWS SDK config from settings (convenience function)
pub async fn build_aws_config(settings: &Settings) -> SdkConfig {
    AwsConfigBuilder::new(settings).build_sdk_config().await
}

/// Create an S3 client from settings (convenience function)
pub async fn create_s3_client(settings: &Settings) -> S3SdkClient {
    AwsConfigBuilder::new(settings).build_s3_client().await
}

/// Create an SSM client from settings (convenience function)
pub async fn create_ssm_client(settings: &Settings) -> SsmSdkClient {
    AwsConfigBuilder::new(settings).build_ssm_client().await
}
