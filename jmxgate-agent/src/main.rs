//! jmxgate-agent - exposes this worker's management objects
//!
//! The agent runs next to each worker and:
//! - Registers the built-in runtime object
//! - Serves the management protocol until Ctrl+C

use anyhow::Result;
use clap::Parser;
use jmxgate_agent::server::{served_commands, start_server};
use jmxgate_common::{runtime_object, InMemoryRegistry};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[derive(Parser)]
#[command(name = "jmxgate-agent")]
#[command(about = "Serve this worker's management objects to a jmxgate coordinator", long_about = None)]
#[command(version)]
struct Args {
    /// Address to listen on (host:port)
    #[arg(short, long, default_value = "0.0.0.0:12321")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("jmxgate-agent starting...");

    let registry = InMemoryRegistry::new();
    registry.register(runtime_object("jmxgate-agent", env!("CARGO_PKG_VERSION")));
    info!("Registered {} management object(s)", registry.len());

    let server = start_server(Arc::new(registry), args.listen).await?;

    info!(
        "jmxgate-agent listening on {}, commands: {:?}. Press Ctrl+C to exit.",
        server.local_addr,
        served_commands()
    );

    signal::ctrl_c().await?;
    info!("Shutdown signal received");

    server.shutdown().await?;

    info!("jmxgate-agent stopped");
    Ok(())
}
