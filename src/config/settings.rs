//! Application settings and configuration
//!
//! This module provides configuration management for the admin tooling,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Runtime environment of the tooling itself (not a workload env).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeEnvironment::Development => write!(f, "development"),
            RuntimeEnvironment::Staging => write!(f, "staging"),
            RuntimeEnvironment::Production => write!(f, "production"),
        }
    }
}

impl Default for RuntimeEnvironment {
    fn default() -> Self {
        RuntimeEnvironment::Development
    }
}

impl std::str::FromStr for RuntimeEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeEnvironment::Development),
            "staging" | "stage" => Ok(RuntimeEnvironment::Staging),
            "production" | "prod" => Ok(RuntimeEnvironment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: RuntimeEnvironment,
    pub log_level: String,

    // AWS settings
    pub aws_region: String,
    #[serde(skip_serializing)]
    pub aws_access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub aws_secret_access_key: Option<String>,
    pub s3_endpoint_url: Option<String>,
    pub ssm_endpoint_url: Option<String>,

    // Config storage defaults
    /// Default S3 directory for config backups, e.g. `s3://my-bucket/config/`
    pub s3folder_config: Option<String>,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            app_name: env_or_default("APP_NAME", "aws-env-config"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            aws_region: env_or_default("AWS_REGION", "us-east-1"),
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            s3_endpoint_url: env::var("S3_ENDPOINT_URL").ok(),
            ssm_endpoint_url: env::var("SSM_ENDPOINT_URL").ok(),

            s3folder_config: env::var("S3FOLDER_CONFIG").ok(),
        };

        settings.validate().context("invalid settings")?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        if self.aws_region.is_empty() {
            anyhow::bail!("AWS_REGION cannot be empty");
        }
        if let Some(ref folder) = self.s3folder_config {
            if !folder.starts_with("s3://") {
                anyhow::bail!("S3FOLDER_CONFIG must be an s3:// URI, got {folder:?}");
            }
        }
        Ok(())
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == RuntimeEnvironment::Development
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == RuntimeEnvironment::Production
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "aws-env-config".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: RuntimeEnvironment::Development,
            log_level: "info".to_string(),
            aws_region: "us-east-1".to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            s3_endpoint_url: None,
            ssm_endpoint_url: None,
            s3folder_config: None,
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
