use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use awsweep::cli::{Cli, Command, SweepArgs};
use awsweep::error::SweepError;
use awsweep::{AwsClient, DeletionOutcome, output, run, volumes};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    execute(cli.command).await?;

    Ok(())
}

async fn execute(command: Command) -> Result<(), SweepError> {
    match command {
        Command::Sweep(args) => {
            let client = build_client(&args)?;
            let outcomes = run::run(&client, args.mode()).await?;
            report(&args, &outcomes)
        }
        Command::Volumes(args) => {
            let client = build_client(&args)?;
            let outcomes = volumes::sweep_available_volumes(&client, args.mode()).await?;
            report(&args, &outcomes)
        }
        Command::All(args) => {
            let client = build_client(&args)?;
            let outcomes = run::run_all(&client, args.mode()).await?;
            report(&args, &outcomes)
        }
    }
}

fn build_client(args: &SweepArgs) -> Result<AwsClient, SweepError> {
    let credentials = args.credentials()?;
    let client = match &args.endpoint_url {
        Some(base) => AwsClient::with_base_url(args.region.clone(), credentials, base.clone())?,
        None => AwsClient::new(args.region.clone(), credentials)?,
    };
    Ok(client)
}

fn report(args: &SweepArgs, outcomes: &[DeletionOutcome]) -> Result<(), SweepError> {
    if args.json {
        println!("{}", output::render_json(outcomes)?);
    } else if !outcomes.is_empty() {
        println!("{}", output::render_table(outcomes));
    }
    Ok(())
}
