//! One-shot connector registration

use anyhow::{Context, Result, bail};
use clap::Args;
use shadowmesh_config::Config;
use shadowmesh_connectors::{
    ConnectClient, ConnectorControl, ConnectorRegistrar, RegistrationOutcome, RetryPolicy,
};
use tracing::info;

use super::shutdown_token;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Print the connector status instead of registering
    #[arg(long)]
    pub status: bool,
}

pub async fn run(args: RegisterArgs, config: Config) -> Result<()> {
    let client = ConnectClient::from_config(&config.connector, &config.ingest.topic_prefix)
        .context("failed to build connector client")?;

    if args.status {
        let status = client.status().await;
        println!("{}: {}", client.name(), status);
        return Ok(());
    }

    let registrar = ConnectorRegistrar::new(client, RetryPolicy::from(&config.connector));
    match registrar.register(&shutdown_token()).await {
        RegistrationOutcome::Registered { response, attempts } => {
            info!(?response, attempts, "connector registration complete");
            Ok(())
        }
        RegistrationOutcome::Exhausted {
            attempts,
            last_error,
        } => bail!(
            "connector registration failed after {} attempts: {}",
            attempts,
            last_error
        ),
        RegistrationOutcome::Cancelled { attempts } => {
            bail!("connector registration cancelled after {} attempts", attempts)
        }
    }
}
