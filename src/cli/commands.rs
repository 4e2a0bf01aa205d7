use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::coordinator::{Coordinator, QueryParams};
use anyhow::{Context, Result};
use jmxgate_common::CallerIdentity;
use tracing::info;

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let coordinator = Coordinator::from_config(&config);
    let identity = CallerIdentity::new(cli.user, cli.roles);

    match cli.command {
        Some(Commands::Query {
            command,
            mbean,
            attribute,
            host_port,
        }) => {
            let params = QueryParams {
                command: Some(command),
                mbean,
                attribute,
                host_port,
            };
            let response = coordinator.handle(&identity, &params).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Some(Commands::Overview) => {
            let overview = coordinator.overview(&identity).await;
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        None => {}
    }

    Ok(())
}
