//! CLI tool to read a deployed config payload back from S3
//!
//! Usage:
//!   cargo run --bin read_config -- \
//!       --s3folder-config s3://my-bucket/config/ --parameter-name my_app-dev

use anyhow::Result;
use aws_env_config::config::{create_s3_client, Settings};
use aws_env_config::logging::init_logging;
use aws_env_config::store::read_config;
use clap::Parser;

/// Read a deployed config payload from S3
#[derive(Parser, Debug)]
#[command(name = "read_config")]
#[command(about = "Read a deployed config payload from S3")]
struct Args {
    /// S3 directory holding the config backups (overrides S3FOLDER_CONFIG)
    #[arg(long)]
    s3folder_config: Option<String>,

    /// Name of the deployed parameter, e.g. my_app-dev
    #[arg(short, long)]
    parameter_name: String,
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

    let s3_client = create_s3_client(&settings).await;
    let (payload, version) =
        read_config(&s3_client, &s3folder_config, &args.parameter_name).await?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    eprintln!("config version: {}", version);

    Ok(())
}
