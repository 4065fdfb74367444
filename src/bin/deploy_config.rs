//! CLI tool to deploy a config payload to SSM Parameter Store and S3
//!
//! Usage:
//!   cargo run --bin deploy_config -- \
//!       --config config.json --secret-config secret-config.json \
//!       --s3folder-config s3://my-bucket/config/ --env dev --secure

use anyhow::Result;
use aws_env_config::config::{create_s3_client, create_ssm_client, Settings};
use aws_env_config::logging::init_logging;
use aws_env_config::model::{ConfigSet, GenericEnv};
use aws_env_config::store::{PutOptions, S3Uri};
use aws_sdk_ssm::types::ParameterType;
use clap::Parser;
use std::path::PathBuf;

/// Deploy a config payload to SSM Parameter Store and S3
#[derive(Parser, Debug)]
#[command(name = "deploy_config")]
#[command(about = "Deploy a config payload to SSM Parameter Store and S3")]
struct Args {
    /// Path to the non-secret config JSON file
    #[arg(long)]
    config: PathBuf,

    /// Path to the secret config JSON file
    #[arg(long)]
    secret_config: PathBuf,

    /// Config version label recorded with the deployment
    #[arg(long, default_value = "0.1.0")]
    config_version: String,

    /// Env to deploy; omit to deploy the consolidated all-envs config
    #[arg(short, long)]
    env: Option<String>,

    /// S3 directory for config backups (overrides S3FOLDER_CONFIG)
    #[arg(long)]
    s3folder_config: Option<String>,

    /// Store the parameter as a SecureString
    #[arg(long)]
    secure: bool,

    /// Parameter description
    #[arg(long)]
    description: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load()?;
    init_logging(&settings.log_level);

    let s3folder_config = args
        .s3folder_config
        .clone()
        .or_else(|| settings.s3folder_config.clone())
        .ok_or_else(|| anyhow::anyhow!("pass --s3folder-config or set S3FOLDER_CONFIG"))?;
    let s3dir_config = S3Uri::parse(&s3folder_config)?.into_dir();

    let config = ConfigSet::<GenericEnv>::load_from_files(
        &args.config,
        &args.secret_config,
        &args.config_version,
    )?;

    let ssm_client = create_ssm_client(&settings).await;
    let s3_client = create_s3_client(&settings).await;

    let mut options = PutOptions::new().with_overwrite(true);
    if args.secure {
        options = options.with_type(ParameterType::SecureString);
    }
    if let Some(ref description) = args.description {
        options = options.with_description(description.clone());
    }

    let result = config
        .deploy_env_parameter(
            &ssm_client,
            &s3_client,
            &s3dir_config,
            args.env.as_deref(),
            &options,
        )
        .await?;

    println!("\nProject: {}", config.project_name());
    println!("Env: {}", args.env.as_deref().unwrap_or("all"));
    println!("SSM deployed: {}", result.is_ssm_deployed());
    println!("S3 deployed: {}", result.is_s3_deployed());
    if let Some(ref parameter) = result.parameter {
        println!("Parameter: {} (version {})", parameter.name, parameter.version);
    }
    if let Some(ref s3uri) = result.s3uri_versioned {
        println!("Backup: {}", s3uri);
    }

    Ok(())
}
