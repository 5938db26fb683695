use clap::{Parser, Subcommand};

use crate::error::SweepError;
use crate::providers::aws::Credentials;
use crate::run::RunMode;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate every tagged resource in the region and delete it
    Sweep(SweepArgs),
    /// Delete EBS volumes left in the "available" state
    Volumes(SweepArgs),
    /// Run the volume sweep followed by the tagged-resource sweep
    All(SweepArgs),
}

#[derive(clap::Args, Debug)]
pub struct SweepArgs {
    /// AWS region to operate in
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Perform real deletions; without this flag every run is a preview
    #[arg(long)]
    pub delete: bool,

    /// Override the provider endpoint (mock servers, LocalStack)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Emit outcomes as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl SweepArgs {
    pub fn mode(&self) -> RunMode {
        RunMode::from_delete_flag(self.delete)
    }

    /// Static credentials are all-or-nothing; a partial pair is a
    /// configuration error rather than a silent fallback to the ambient
    /// credential chain.
    pub fn credentials(&self) -> Result<Option<Credentials>, SweepError> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Some(Credentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: self.session_token.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(SweepError::Config(
                "access key id and secret access key must be provided together".to_string(),
            )),
        }
    }
}
