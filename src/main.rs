use clap::Parser;
use jmxgate::cli::{commands, Cli};
use std::process;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Logs go to stderr so stdout stays machine-readable JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting jmxgate v{}", env!("CARGO_PKG_VERSION"));

    if cli.command.is_none() {
        eprintln!("No command specified. Use --help for usage information.");
        process::exit(1);
    }

    if let Err(e) = commands::handle_command(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
